// order_service/src/pipelines/create_order_pipeline.rs

use crate::config::ListingCachePolicy;
use crate::errors::OrderError;
use crate::models::NewOrder;
use crate::pipelines::contexts::CreateOrderCtxData;
use crate::ports::{Message, ProductLookup};
use crate::services::order_service::listing_cache_key;
use chrono::Utc;
use orderflow::{ContextData, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub const VALIDATE_PRODUCT: &str = "validate_product";
pub const PRICE_ORDER: &str = "price_order";
pub const PERSIST_ORDER: &str = "persist_order";
pub const INVALIDATE_PRODUCT_LISTING: &str = "invalidate_product_listing";
pub const ANNOUNCE_ORDER_CREATED: &str = "announce_order_created";

/// validate → price → persist → (invalidate listing) → announce.
///
/// Everything up to and including `persist_order` aborts the run on failure.
/// The last two steps are optional and only log their failures.
pub fn build_create_order_pipeline() -> Pipeline<CreateOrderCtxData, OrderError> {
  let keep_stale_listing: SkipCondition<CreateOrderCtxData> = Arc::new(|ctx_data: ContextData<CreateOrderCtxData>| {
    ctx_data.read().ports.settings.listing_policy != ListingCachePolicy::InvalidateOnWrite
  });

  let mut p = Pipeline::<CreateOrderCtxData, OrderError>::new(&[
    (VALIDATE_PRODUCT, false, None),
    (PRICE_ORDER, false, None),
    (PERSIST_ORDER, false, None),
    (INVALIDATE_PRODUCT_LISTING, true, Some(keep_stale_listing)),
    (ANNOUNCE_ORDER_CREATED, true, None),
  ]);

  p.on_root(VALIDATE_PRODUCT, validate_product);
  p.on_root(PRICE_ORDER, price_order);
  p.on_root(PERSIST_ORDER, persist_order);
  p.on_root(INVALIDATE_PRODUCT_LISTING, invalidate_product_listing);
  p.on_root(ANNOUNCE_ORDER_CREATED, announce_order_created);
  p
}

#[instrument(name = "step::validate_product", skip_all)]
async fn validate_product(ctx_data: ContextData<CreateOrderCtxData>) -> Result<PipelineControl, OrderError> {
  let (catalog, product_id, correlation_id) = {
    let guard = ctx_data.read();
    (
      guard.ports.catalog.clone(),
      guard.product_id.clone(),
      guard.correlation_id.clone(),
    )
  };

  match catalog.lookup(&product_id, &correlation_id).await? {
    ProductLookup::Found => {
      debug!(%product_id, "Product exists.");
      Ok(PipelineControl::Continue)
    }
    ProductLookup::NotFound => {
      info!(%product_id, "Product does not exist; order rejected.");
      Err(OrderError::ProductNotFound(product_id))
    }
  }
}

async fn price_order(ctx_data: ContextData<CreateOrderCtxData>) -> Result<PipelineControl, OrderError> {
  let mut guard = ctx_data.write();
  let priced = NewOrder::priced(
    guard.product_id.clone(),
    guard.unit_price,
    guard.qty,
    guard.correlation_id.clone(),
    Utc::now(),
  )?;
  debug!(total_price = %priced.total_price, qty = priced.qty, "Order priced.");
  guard.priced = Some(priced);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "step::persist_order", skip_all)]
async fn persist_order(ctx_data: ContextData<CreateOrderCtxData>) -> Result<PipelineControl, OrderError> {
  let (repository, priced) = {
    let guard = ctx_data.read();
    (guard.ports.repository.clone(), guard.priced.clone())
  };
  let priced = priced.ok_or_else(|| OrderError::Internal(format!("{PERSIST_ORDER} ran before {PRICE_ORDER}")))?;

  let order = repository.create(&priced).await.map_err(|e| {
    error!(error = %e, "Failed to save order.");
    OrderError::from(e)
  })?;
  info!(order_id = %order.id, "Order created.");

  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "step::invalidate_product_listing", skip_all)]
async fn invalidate_product_listing(ctx_data: ContextData<CreateOrderCtxData>) -> Result<PipelineControl, OrderError> {
  let (cache, cache_key) = {
    let guard = ctx_data.read();
    (guard.ports.cache.clone(), listing_cache_key(&guard.product_id))
  };

  match cache.delete(&cache_key).await {
    Ok(()) => {
      debug!(%cache_key, "Cached listing invalidated.");
      ctx_data.write().listing_invalidated = true;
    }
    Err(e) => warn!(%cache_key, error = %e, "Could not invalidate cached listing; it stays until expiry."),
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "step::announce_order_created", skip_all)]
async fn announce_order_created(ctx_data: ContextData<CreateOrderCtxData>) -> Result<PipelineControl, OrderError> {
  let mut guard = ctx_data.write();
  let Some(order) = guard.order.as_ref() else {
    return Err(OrderError::Internal(format!("{ANNOUNCE_ORDER_CREATED} ran before {PERSIST_ORDER}")));
  };
  let settings = &guard.ports.settings;

  let enqueued = match Message::json(&settings.exchange, &settings.order_created_routing_key, order) {
    Ok(message) => match guard.ports.events.dispatch(message) {
      Ok(()) => true,
      Err(e) => {
        warn!(order_id = %order.id, correlation_id = %order.correlation_id, error = %e, "Failed to enqueue order.created event.");
        false
      }
    },
    Err(e) => {
      warn!(order_id = %order.id, error = %e, "Failed to serialize order.created event.");
      false
    }
  };
  guard.event_enqueued = enqueued;
  Ok(PipelineControl::Continue)
}
