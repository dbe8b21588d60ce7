// order_service/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::TotalOutOfRange;
use crate::ports::catalog::ProductLookupError;
use crate::ports::repository::RepositoryError;
use orderflow::FlowError;

/// Failures that abort an order operation and reach the caller.
///
/// Cache and publish problems never surface here; they are logged where they happen.
#[derive(Debug, Error)]
pub enum OrderError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Product not found: {0}")]
  ProductNotFound(String),

  #[error("Product service unavailable: {0}")]
  UpstreamUnavailable(String),

  #[error("Product service returned status {status}")]
  UpstreamError { status: u16 },

  #[error("Persistence Error: {0}")]
  Persistence(#[from] RepositoryError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] FlowError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<ProductLookupError> for OrderError {
  fn from(err: ProductLookupError) -> Self {
    match err {
      ProductLookupError::Unavailable(reason) => OrderError::UpstreamUnavailable(reason),
      ProductLookupError::UnexpectedStatus(status) => OrderError::UpstreamError { status },
    }
  }
}

impl From<TotalOutOfRange> for OrderError {
  fn from(err: TotalOutOfRange) -> Self {
    OrderError::Validation(err.to_string())
  }
}

impl ResponseError for OrderError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      OrderError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      // The product is referenced from the request body, so this is the client's mistake.
      OrderError::ProductNotFound(_) => HttpResponse::BadRequest().json(json!({"error": self.to_string()})),
      OrderError::UpstreamUnavailable(_) => {
        HttpResponse::ServiceUnavailable().json(json!({"error": "Product service unavailable"}))
      }
      OrderError::UpstreamError { status } => {
        HttpResponse::BadGateway().json(json!({"error": "Product service error", "upstreamStatus": status}))
      }
      OrderError::Persistence(_) => {
        HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"}))
      }
      OrderError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      OrderError::Workflow(source) => {
        tracing::error!(workflow_error_source = ?source, "Workflow error details");
        HttpResponse::InternalServerError().json(json!({"error": "Workflow processing error"}))
      }
      OrderError::Internal(_) => HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred"})),
    }
  }
}

pub type Result<T, E = OrderError> = std::result::Result<T, E>;
