// order_service/src/main.rs

use order_service::config::AppConfig;
use order_service::events::spawn_dispatcher;
use order_service::ports::{HttpProductCatalog, InMemoryListingCache, PgOrderRepository, TopicExchange};
use order_service::services::{OrderPorts, OrderService, OrderSettings};
use order_service::state::AppState;
use order_service::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

const ORDER_EVENTS_BINDING: &str = "order.#";
const ORDER_EVENTS_QUEUE: usize = 256;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting order service...");

  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;

  let db_pool = PgPool::connect(&app_config.database_url)
    .await
    .context("Failed to connect to the database")?;
  tracing::info!("Successfully connected to the database.");

  let catalog = HttpProductCatalog::with_timeout(&app_config.product_service_url, app_config.product_lookup_timeout)
    .context("Failed to build the product service client")?;

  let settings = OrderSettings::from(&app_config);
  let exchange = Arc::new(TopicExchange::new(settings.exchange.clone()));
  let mut order_events = exchange.bind(ORDER_EVENTS_BINDING, ORDER_EVENTS_QUEUE);
  tokio::spawn(async move {
    while let Some(message) = order_events.recv().await {
      tracing::info!(
        routing_key = %message.routing_key,
        payload = %String::from_utf8_lossy(&message.body),
        "Order event received."
      );
    }
  });

  let (events, dispatch_worker, mut publish_failures) = spawn_dispatcher(exchange.clone(), app_config.event_queue_capacity);
  tokio::spawn(async move {
    while let Some(failure) = publish_failures.recv().await {
      tracing::error!(routing_key = %failure.routing_key, error = %failure.error, "Order event was not published.");
    }
  });

  let ports = OrderPorts {
    catalog: Arc::new(catalog),
    repository: Arc::new(PgOrderRepository::new(db_pool)),
    cache: Arc::new(InMemoryListingCache::new()),
    events,
    settings: Arc::new(settings),
  };
  let app_state = AppState::new(OrderService::new(ports));

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  let report = dispatch_worker.shutdown().await;
  tracing::info!(delivered = report.delivered, failed = report.failed, "Order service stopped.");
  Ok(())
}
