// order_service/src/ports/mod.rs

//! Capabilities the orchestration service consumes, each with the adapters this
//! binary wires in. Everything is used as `Arc<dyn Trait>` so tests can swap in doubles.

pub mod cache;
pub mod catalog;
pub mod publisher;
pub mod repository;

pub use cache::{CacheError, InMemoryListingCache, ListingCache};
pub use catalog::{HttpProductCatalog, ProductCatalog, ProductLookup, ProductLookupError};
pub use publisher::{EventPublisher, Message, PublishError, TopicExchange, ORDERS_EXCHANGE};
pub use repository::{InMemoryOrderRepository, OrderRepository, PgOrderRepository, RepositoryError};
