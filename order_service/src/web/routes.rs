// order_service/src/web/routes.rs

use crate::web::handlers::order_handlers;
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/orders")
        .route("", web::post().to(order_handlers::create_order_handler))
        .route(
          "/product/{product_id}",
          web::get().to(order_handlers::list_orders_by_product_handler),
        ),
    );
}
