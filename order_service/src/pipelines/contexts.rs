// order_service/src/pipelines/contexts.rs

//! Data carried through each pipeline run. Handlers receive these wrapped in `orderflow::ContextData`.

use crate::models::{NewOrder, Order};
use crate::services::order_service::{listing_cache_key, OrderPorts};
use rust_decimal::Decimal;

pub struct CreateOrderCtxData {
  pub ports: OrderPorts,
  pub correlation_id: String,
  pub product_id: String,
  pub unit_price: Decimal,
  pub qty: i32,
  /// Set by `price_order`.
  pub priced: Option<NewOrder>,
  /// Set by `persist_order`; only then does the order have an id.
  pub order: Option<Order>,
  pub listing_invalidated: bool,
  pub event_enqueued: bool,
}

impl CreateOrderCtxData {
  pub fn new(ports: OrderPorts, correlation_id: &str, product_id: &str, unit_price: Decimal, qty: i32) -> Self {
    Self {
      ports,
      correlation_id: correlation_id.to_string(),
      product_id: product_id.to_string(),
      unit_price,
      qty,
      priced: None,
      order: None,
      listing_invalidated: false,
      event_enqueued: false,
    }
  }
}

pub struct ListOrdersCtxData {
  pub ports: OrderPorts,
  pub product_id: String,
  pub cache_key: String,
  pub orders: Option<Vec<Order>>,
  pub served_from_cache: bool,
}

impl ListOrdersCtxData {
  pub fn new(ports: OrderPorts, product_id: &str) -> Self {
    Self {
      ports,
      product_id: product_id.to_string(),
      cache_key: listing_cache_key(product_id),
      orders: None,
      served_from_cache: false,
    }
  }
}
