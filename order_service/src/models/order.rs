// order_service/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use thiserror::Error;
use uuid::Uuid;

/// Matches the `order_status` enum in schema.sql. Only `Pending` is ever assigned here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
pub enum OrderStatus {
  Pending,
}

/// A persisted order. Also the payload of `order.created` events and of cached listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub product_id: String,
  pub qty: i32,
  /// Written as a JSON number with every digit kept.
  #[serde(with = "rust_decimal::serde::arbitrary_precision")]
  pub total_price: Decimal,
  pub status: OrderStatus,
  #[serde(default)]
  pub correlation_id: String,
  pub created_at: DateTime<Utc>,
}

/// An order that has been priced but not stored yet, so it has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub product_id: String,
  pub qty: i32,
  pub total_price: Decimal,
  pub status: OrderStatus,
  pub correlation_id: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order total of {qty} x {unit_price} is out of range")]
pub struct TotalOutOfRange {
  pub unit_price: Decimal,
  pub qty: i32,
}

impl NewOrder {
  /// Prices a pending order. `total_price` is fixed here and never recomputed.
  pub fn priced(
    product_id: impl Into<String>,
    unit_price: Decimal,
    qty: i32,
    correlation_id: impl Into<String>,
    created_at: DateTime<Utc>,
  ) -> Result<Self, TotalOutOfRange> {
    let total_price = unit_price
      .checked_mul(Decimal::from(qty))
      .ok_or(TotalOutOfRange { unit_price, qty })?;
    Ok(Self {
      product_id: product_id.into(),
      qty,
      total_price,
      status: OrderStatus::Pending,
      correlation_id: correlation_id.into(),
      created_at,
    })
  }

  /// Completes the record with the id a store assigned to it.
  pub fn into_order(self, id: Uuid) -> Order {
    Order {
      id,
      product_id: self.product_id,
      qty: self.qty,
      total_price: self.total_price,
      status: self.status,
      correlation_id: self.correlation_id,
      created_at: self.created_at,
    }
  }
}
