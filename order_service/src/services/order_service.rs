// order_service/src/services/order_service.rs

use crate::config::{AppConfig, ListingCachePolicy};
use crate::errors::{OrderError, Result};
use crate::events::EventDispatcher;
use crate::models::Order;
use crate::pipelines::contexts::{CreateOrderCtxData, ListOrdersCtxData};
use crate::pipelines::{build_create_order_pipeline, build_list_orders_pipeline};
use crate::ports::{ListingCache, OrderRepository, ProductCatalog, ORDERS_EXCHANGE};
use orderflow::{ContextData, Pipeline, PipelineResult};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const ORDER_CREATED_ROUTING_KEY: &str = "order.created";
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(300);

/// Cache key holding the serialized order list of one product.
pub fn listing_cache_key(product_id: &str) -> String {
  format!("orders:product:{product_id}")
}

#[derive(Debug, Clone)]
pub struct OrderSettings {
  pub listing_ttl: Duration,
  pub listing_policy: ListingCachePolicy,
  pub exchange: String,
  pub order_created_routing_key: String,
}

impl Default for OrderSettings {
  fn default() -> Self {
    Self {
      listing_ttl: DEFAULT_LISTING_TTL,
      listing_policy: ListingCachePolicy::default(),
      exchange: ORDERS_EXCHANGE.to_string(),
      order_created_routing_key: ORDER_CREATED_ROUTING_KEY.to_string(),
    }
  }
}

impl From<&AppConfig> for OrderSettings {
  fn from(config: &AppConfig) -> Self {
    Self {
      listing_ttl: config.listing_cache_ttl,
      listing_policy: config.listing_cache_policy,
      ..Self::default()
    }
  }
}

/// Everything the order workflows talk to. Cloned into every pipeline run.
#[derive(Clone)]
pub struct OrderPorts {
  pub catalog: Arc<dyn ProductCatalog>,
  pub repository: Arc<dyn OrderRepository>,
  pub cache: Arc<dyn ListingCache>,
  pub events: EventDispatcher,
  pub settings: Arc<OrderSettings>,
}

/// Entry point for the two order operations. Pipelines are built once and reused.
pub struct OrderService {
  ports: OrderPorts,
  create_pipeline: Pipeline<CreateOrderCtxData, OrderError>,
  list_pipeline: Pipeline<ListOrdersCtxData, OrderError>,
}

impl OrderService {
  pub fn new(ports: OrderPorts) -> Self {
    Self {
      ports,
      create_pipeline: build_create_order_pipeline(),
      list_pipeline: build_list_orders_pipeline(),
    }
  }

  pub fn settings(&self) -> &OrderSettings {
    &self.ports.settings
  }

  /// Validates the product, prices and stores the order, then announces it.
  ///
  /// Returns the stored order once persistence succeeds, whatever happens to the
  /// cache invalidation or the event afterwards.
  #[instrument(name = "OrderService::create_order", skip(self, unit_price), err(Display))]
  pub async fn create_order(
    &self,
    correlation_id: &str,
    product_id: &str,
    unit_price: Decimal,
    qty: i32,
  ) -> Result<Order> {
    let ctx_data = ContextData::new(CreateOrderCtxData::new(
      self.ports.clone(),
      correlation_id,
      product_id,
      unit_price,
      qty,
    ));

    if let PipelineResult::Stopped = self.create_pipeline.run(ctx_data.clone()).await? {
      return Err(OrderError::Internal("create-order workflow stopped early".to_string()));
    }

    let order = ctx_data.write().order.take();
    order.ok_or_else(|| OrderError::Internal("create-order workflow finished without an order".to_string()))
  }

  /// Lists a product's orders, preferring the cached listing.
  #[instrument(name = "OrderService::get_orders_by_product_id", skip(self), err(Display))]
  pub async fn get_orders_by_product_id(&self, product_id: &str) -> Result<Vec<Order>> {
    let ctx_data = ContextData::new(ListOrdersCtxData::new(self.ports.clone(), product_id));
    self.list_pipeline.run(ctx_data.clone()).await?;

    let orders = ctx_data.write().orders.take();
    orders.ok_or_else(|| OrderError::Internal("list-orders workflow finished without a result".to_string()))
  }
}
