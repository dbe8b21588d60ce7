// order_service/src/models/mod.rs

//! Data structures for the order domain and its persisted records.

pub mod order;

pub use order::{NewOrder, Order, OrderStatus, TotalOutOfRange};
