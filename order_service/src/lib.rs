// order_service/src/lib.rs

//! Order orchestration service.
//!
//! Creates orders after checking the product against the product service, lists a
//! product's orders through a cache-aside read, and announces new orders on the
//! `orders_exchange` topic exchange. Both use cases run as `orderflow` pipelines
//! over the capabilities in [`ports`].

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod pipelines;
pub mod ports;
pub mod services;
pub mod state;
pub mod web;

pub use errors::{OrderError, Result};
pub use services::{OrderPorts, OrderService, OrderSettings};
