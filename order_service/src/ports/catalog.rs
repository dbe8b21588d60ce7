// order_service/src/ports/catalog.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductLookup {
  Found,
  NotFound,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductLookupError {
  /// Transport failure, including the call deadline running out.
  #[error("product service unreachable: {0}")]
  Unavailable(String),

  #[error("product service answered with status {0}")]
  UnexpectedStatus(u16),
}

/// Existence check against the product service. One attempt per call, no retries.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
  async fn lookup(&self, product_id: &str, correlation_id: &str) -> Result<ProductLookup, ProductLookupError>;
}

/// `GET {base_url}/products/{id}` over an injected `reqwest::Client`.
#[derive(Clone)]
pub struct HttpProductCatalog {
  http: Client,
  base_url: String,
}

impl HttpProductCatalog {
  pub fn new(http: Client, base_url: impl Into<String>) -> Self {
    Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  /// Builds a dedicated client whose every request is bounded by `timeout`.
  pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
    let http = Client::builder().timeout(timeout).build()?;
    Ok(Self::new(http, base_url))
  }

  /// `None` for ids that cannot be a single path segment (`""`, `"."`, `".."`).
  /// Everything else is percent-encoded, so `/`, `?` and `#` stay inside the id.
  fn product_url(&self, product_id: &str) -> Result<Option<Url>, ProductLookupError> {
    if matches!(product_id, "" | "." | "..") {
      return Ok(None);
    }
    let invalid_base = |reason: String| ProductLookupError::Unavailable(format!("invalid product service url: {reason}"));

    let mut url = Url::parse(&self.base_url).map_err(|e| invalid_base(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|_| invalid_base(self.base_url.clone()))?
      .pop_if_empty()
      .push("products")
      .push(product_id);
    Ok(Some(url))
  }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
  #[instrument(name = "catalog::lookup", skip(self), fields(correlation_id = %correlation_id))]
  async fn lookup(&self, product_id: &str, correlation_id: &str) -> Result<ProductLookup, ProductLookupError> {
    let Some(url) = self.product_url(product_id)? else {
      info!("Product id cannot name a product resource.");
      return Ok(ProductLookup::NotFound);
    };

    let mut request = self.http.get(url);
    if !correlation_id.is_empty() {
      request = request.header(CORRELATION_ID_HEADER, correlation_id);
    }

    let response = request.send().await.map_err(|e| {
      warn!(error = %e, timeout = e.is_timeout(), "Product service call failed.");
      ProductLookupError::Unavailable(e.to_string())
    })?;

    match response.status() {
      StatusCode::NOT_FOUND => {
        info!("Product service reports product missing.");
        Ok(ProductLookup::NotFound)
      }
      status if status.is_success() => Ok(ProductLookup::Found),
      status => {
        warn!(%status, "Product service returned an error status.");
        Err(ProductLookupError::UnexpectedStatus(status.as_u16()))
      }
    }
  }
}
