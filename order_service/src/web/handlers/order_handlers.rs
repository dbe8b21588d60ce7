// order_service/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::{OrderError, Result};
use crate::ports::catalog::CORRELATION_ID_HEADER;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  pub product_id: String,
  pub price: Decimal,
  pub qty: i32,
}

impl CreateOrderRequest {
  pub fn validate(&self) -> Result<()> {
    if self.product_id.trim().is_empty() {
      return Err(OrderError::Validation("productId is required".to_string()));
    }
    if self.price <= Decimal::ZERO {
      return Err(OrderError::Validation("price must be greater than 0".to_string()));
    }
    if self.qty < 1 {
      return Err(OrderError::Validation("qty must be at least 1".to_string()));
    }
    Ok(())
  }
}

/// Correlation id from the inbound request, or empty when absent or not valid UTF-8.
fn correlation_id(req: &HttpRequest) -> String {
  req
    .headers()
    .get(CORRELATION_ID_HEADER)
    .and_then(|value| value.to_str().ok())
    .unwrap_or_default()
    .to_string()
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, req, payload),
  fields(product_id = %payload.product_id, qty = payload.qty)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  payload.validate()?;

  let correlation_id = correlation_id(&req);
  let order = app_state
    .orders
    .create_order(&correlation_id, &payload.product_id, payload.price, payload.qty)
    .await?;
  info!(order_id = %order.id, "Order accepted.");

  let mut response = HttpResponse::Created();
  if !correlation_id.is_empty() {
    response.insert_header((CORRELATION_ID_HEADER, correlation_id));
  }
  Ok(response.json(order))
}

#[instrument(name = "handler::list_orders_by_product", skip(app_state, path), fields(product_id = %path.as_str()))]
pub async fn list_orders_by_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let orders = app_state.orders.get_orders_by_product_id(&product_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}
