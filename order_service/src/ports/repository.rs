// order_service/src/ports/repository.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{NewOrder, Order};

#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("Database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Order store error: {0}")]
  Backend(String),
}

/// Durable order storage. No business rules live behind this trait.
#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Stores the order and returns it with its assigned id.
  async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

  /// All orders referencing `product_id`, oldest first.
  async fn get_by_product_id(&self, product_id: &str) -> Result<Vec<Order>, RepositoryError>;
}

const ORDER_COLUMNS: &str = "id, product_id, qty, total_price, status, correlation_id, created_at";

/// Postgres-backed store over the `orders` table from schema.sql. Ids come from `gen_random_uuid()`.
#[derive(Clone)]
pub struct PgOrderRepository {
  pool: PgPool,
}

impl PgOrderRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
  #[instrument(name = "pg::create_order", skip(self, order), fields(product_id = %order.product_id))]
  async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
    let sql = format!(
      "INSERT INTO orders (product_id, qty, total_price, status, correlation_id, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
    );
    let stored = sqlx::query_as::<_, Order>(&sql)
      .bind(&order.product_id)
      .bind(order.qty)
      .bind(order.total_price)
      .bind(order.status)
      .bind(&order.correlation_id)
      .bind(order.created_at)
      .fetch_one(&self.pool)
      .await?;
    debug!(order_id = %stored.id, "Order row inserted.");
    Ok(stored)
  }

  #[instrument(name = "pg::orders_by_product", skip(self))]
  async fn get_by_product_id(&self, product_id: &str) -> Result<Vec<Order>, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE product_id = $1 ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, Order>(&sql)
      .bind(product_id)
      .fetch_all(&self.pool)
      .await?;
    debug!(rows = rows.len(), "Orders fetched.");
    Ok(rows)
  }
}

/// Process-local store for tests and database-less runs. Keeps insertion order.
#[derive(Default)]
pub struct InMemoryOrderRepository {
  orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.orders.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.read().is_empty()
  }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
  async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
    let stored = order.clone().into_order(Uuid::new_v4());
    self.orders.write().push(stored.clone());
    Ok(stored)
  }

  async fn get_by_product_id(&self, product_id: &str) -> Result<Vec<Order>, RepositoryError> {
    Ok(
      self
        .orders
        .read()
        .iter()
        .filter(|o| o.product_id == product_id)
        .cloned()
        .collect(),
    )
  }
}
