// order_service/src/config.rs

use crate::errors::{OrderError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Whether creating an order drops the cached listing of its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingCachePolicy {
  /// Listings may lag behind new orders for up to the cache TTL.
  #[default]
  StaleUntilExpiry,
  InvalidateOnWrite,
}

impl FromStr for ListingCachePolicy {
  type Err = OrderError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "stale" | "stale_until_expiry" => Ok(ListingCachePolicy::StaleUntilExpiry),
      "invalidate" | "invalidate_on_write" => Ok(ListingCachePolicy::InvalidateOnWrite),
      other => Err(OrderError::Config(format!("Invalid LISTING_CACHE_POLICY: '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  pub product_service_url: String,
  pub product_lookup_timeout: Duration,

  pub listing_cache_ttl: Duration,
  pub listing_cache_policy: ListingCachePolicy,

  pub event_queue_capacity: usize,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
    let parse = |name: &str, default: &str| -> Result<u64> {
      get_or(name, default)
        .parse::<u64>()
        .map_err(|e| OrderError::Config(format!("Invalid {}: {}", name, e)))
    };

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| OrderError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url =
      lookup("DATABASE_URL").ok_or_else(|| OrderError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;

    let product_service_url = get_or("PRODUCT_SERVICE_URL", "http://product-service:3000");
    let product_lookup_timeout = Duration::from_millis(parse("PRODUCT_LOOKUP_TIMEOUT_MS", "3000")?);

    let listing_cache_ttl = Duration::from_secs(parse("LISTING_CACHE_TTL_SECS", "300")?);
    let listing_cache_policy = get_or("LISTING_CACHE_POLICY", "stale").parse::<ListingCachePolicy>()?;

    let event_queue_capacity = parse("EVENT_QUEUE_CAPACITY", "1024")? as usize;
    if event_queue_capacity == 0 {
      return Err(OrderError::Config("EVENT_QUEUE_CAPACITY must be at least 1".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      product_service_url,
      product_lookup_timeout,
      listing_cache_ttl,
      listing_cache_policy,
      event_queue_capacity,
    })
  }
}
