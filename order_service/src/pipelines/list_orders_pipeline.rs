// order_service/src/pipelines/list_orders_pipeline.rs

use crate::errors::OrderError;
use crate::models::Order;
use crate::pipelines::contexts::ListOrdersCtxData;
use orderflow::{ContextData, Pipeline, PipelineControl};
use tracing::{debug, error, info, instrument, warn};

pub const READ_LISTING_CACHE: &str = "read_listing_cache";
pub const READ_REPOSITORY: &str = "read_repository";
pub const POPULATE_LISTING_CACHE: &str = "populate_listing_cache";

/// Cache-aside read of a product's orders.
///
/// A hit stops the pipeline after the first step. The cache being down, or holding
/// something that does not decode, is treated as a miss.
pub fn build_list_orders_pipeline() -> Pipeline<ListOrdersCtxData, OrderError> {
  let mut p = Pipeline::<ListOrdersCtxData, OrderError>::new(&[
    (READ_LISTING_CACHE, false, None),
    (READ_REPOSITORY, false, None),
    (POPULATE_LISTING_CACHE, true, None),
  ]);

  p.on_root(READ_LISTING_CACHE, read_listing_cache);
  p.on_root(READ_REPOSITORY, read_repository);
  p.on_root(POPULATE_LISTING_CACHE, populate_listing_cache);
  p
}

#[instrument(name = "step::read_listing_cache", skip_all)]
async fn read_listing_cache(ctx_data: ContextData<ListOrdersCtxData>) -> Result<PipelineControl, OrderError> {
  let (cache, cache_key) = {
    let guard = ctx_data.read();
    (guard.ports.cache.clone(), guard.cache_key.clone())
  };

  match cache.get(&cache_key).await {
    Ok(Some(raw)) => match serde_json::from_str::<Vec<Order>>(&raw) {
      Ok(orders) => {
        info!(%cache_key, count = orders.len(), "Orders served from cache.");
        let mut guard = ctx_data.write();
        guard.orders = Some(orders);
        guard.served_from_cache = true;
        return Ok(PipelineControl::Stop);
      }
      Err(e) => warn!(%cache_key, error = %e, "Cached listing could not be decoded; reading from the store."),
    },
    Ok(None) => debug!(%cache_key, "Listing cache miss."),
    Err(e) => warn!(%cache_key, error = %e, "Listing cache unavailable; reading from the store."),
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "step::read_repository", skip_all)]
async fn read_repository(ctx_data: ContextData<ListOrdersCtxData>) -> Result<PipelineControl, OrderError> {
  let (repository, product_id) = {
    let guard = ctx_data.read();
    (guard.ports.repository.clone(), guard.product_id.clone())
  };

  let orders = repository.get_by_product_id(&product_id).await.map_err(|e| {
    error!(%product_id, error = %e, "Failed to load orders.");
    OrderError::from(e)
  })?;
  debug!(%product_id, count = orders.len(), "Orders loaded from the store.");

  ctx_data.write().orders = Some(orders);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "step::populate_listing_cache", skip_all)]
async fn populate_listing_cache(ctx_data: ContextData<ListOrdersCtxData>) -> Result<PipelineControl, OrderError> {
  let (cache, cache_key, ttl, encoded) = {
    let guard = ctx_data.read();
    let Some(orders) = guard.orders.as_ref() else {
      return Err(OrderError::Internal(format!("{POPULATE_LISTING_CACHE} ran before {READ_REPOSITORY}")));
    };
    (
      guard.ports.cache.clone(),
      guard.cache_key.clone(),
      guard.ports.settings.listing_ttl,
      serde_json::to_string(orders),
    )
  };

  let encoded = match encoded {
    Ok(encoded) => encoded,
    Err(e) => {
      warn!(%cache_key, error = %e, "Could not encode listing for the cache.");
      return Ok(PipelineControl::Continue);
    }
  };

  if let Err(e) = cache.set(&cache_key, encoded, ttl).await {
    warn!(%cache_key, error = %e, "Could not store listing in the cache.");
  }
  Ok(PipelineControl::Continue)
}
