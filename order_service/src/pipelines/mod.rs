// order_service/src/pipelines/mod.rs

//! The two order use cases expressed as orderflow pipelines.

pub mod contexts;
pub mod create_order_pipeline;
pub mod list_orders_pipeline;

pub use create_order_pipeline::build_create_order_pipeline;
pub use list_orders_pipeline::build_list_orders_pipeline;
