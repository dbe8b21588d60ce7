// order_service/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use order_service::config::ListingCachePolicy;
use order_service::events::{spawn_dispatcher, DispatchWorker, FailureReceiver};
use order_service::models::{NewOrder, Order};
use order_service::ports::{
  CacheError, EventPublisher, InMemoryListingCache, InMemoryOrderRepository, ListingCache, Message, OrderRepository,
  ProductCatalog, ProductLookup, ProductLookupError, PublishError, RepositoryError,
};
use order_service::services::{OrderPorts, OrderService, OrderSettings};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::Level;

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "order_service=debug".into());
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .with_env_filter(filter)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

// --- Product catalog ---

pub struct StubCatalog {
  answer: Result<ProductLookup, ProductLookupError>,
  /// (product_id, correlation_id) of every lookup.
  pub calls: Mutex<Vec<(String, String)>>,
}

impl StubCatalog {
  pub fn answering(answer: Result<ProductLookup, ProductLookupError>) -> Self {
    Self {
      answer,
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn found() -> Self {
    Self::answering(Ok(ProductLookup::Found))
  }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
  async fn lookup(&self, product_id: &str, correlation_id: &str) -> Result<ProductLookup, ProductLookupError> {
    self.calls.lock().push((product_id.to_string(), correlation_id.to_string()));
    self.answer.clone()
  }
}

// --- Repository ---

#[derive(Default)]
pub struct RecordingRepository {
  inner: InMemoryOrderRepository,
  pub creates: AtomicUsize,
  pub reads: AtomicUsize,
  pub fail_writes: AtomicBool,
  pub fail_reads: AtomicBool,
}

impl RecordingRepository {
  pub fn creates(&self) -> usize {
    self.creates.load(Ordering::SeqCst)
  }

  pub fn reads(&self) -> usize {
    self.reads.load(Ordering::SeqCst)
  }

  pub fn stored(&self) -> usize {
    self.inner.len()
  }
}

#[async_trait]
impl OrderRepository for RecordingRepository {
  async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
    self.creates.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(RepositoryError::Backend("write refused".to_string()));
    }
    self.inner.create(order).await
  }

  async fn get_by_product_id(&self, product_id: &str) -> Result<Vec<Order>, RepositoryError> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(RepositoryError::Backend("read refused".to_string()));
    }
    self.inner.get_by_product_id(product_id).await
  }
}

// --- Cache ---

#[derive(Default)]
pub struct ScriptedCache {
  inner: InMemoryListingCache,
  pub fail_get: AtomicBool,
  pub fail_set: AtomicBool,
  pub fail_delete: AtomicBool,
  pub gets: AtomicUsize,
  pub sets: AtomicUsize,
  pub deletes: AtomicUsize,
  /// TTL passed to the last successful `set`.
  pub last_ttl: Mutex<Option<Duration>>,
}

impl ScriptedCache {
  pub fn failing() -> Self {
    let cache = Self::default();
    cache.fail_get.store(true, Ordering::SeqCst);
    cache.fail_set.store(true, Ordering::SeqCst);
    cache.fail_delete.store(true, Ordering::SeqCst);
    cache
  }

  pub async fn raw(&self, key: &str) -> Option<String> {
    self.inner.get(key).await.ok().flatten()
  }

  pub async fn seed(&self, key: &str, value: String) {
    self.inner.set(key, value, Duration::from_secs(60)).await.ok();
  }

  pub fn sets(&self) -> usize {
    self.sets.load(Ordering::SeqCst)
  }

  pub fn deletes(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ListingCache for ScriptedCache {
  async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
    self.gets.fetch_add(1, Ordering::SeqCst);
    if self.fail_get.load(Ordering::SeqCst) {
      return Err(CacheError("connection refused".to_string()));
    }
    self.inner.get(key).await
  }

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
    self.sets.fetch_add(1, Ordering::SeqCst);
    if self.fail_set.load(Ordering::SeqCst) {
      return Err(CacheError("connection refused".to_string()));
    }
    *self.last_ttl.lock() = Some(ttl);
    self.inner.set(key, value, ttl).await
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    self.deletes.fetch_add(1, Ordering::SeqCst);
    if self.fail_delete.load(Ordering::SeqCst) {
      return Err(CacheError("connection refused".to_string()));
    }
    self.inner.delete(key).await
  }
}

// --- Publisher ---

/// Records published messages. Optionally fails every publish, or blocks each
/// publish until a permit is released through `gate`.
#[derive(Default)]
pub struct RecordingPublisher {
  pub messages: Mutex<Vec<Message>>,
  pub fail: AtomicBool,
  pub gate: Option<Arc<Semaphore>>,
}

impl RecordingPublisher {
  pub fn failing() -> Self {
    let publisher = Self::default();
    publisher.fail.store(true, Ordering::SeqCst);
    publisher
  }

  pub fn gated(gate: Arc<Semaphore>) -> Self {
    Self {
      gate: Some(gate),
      ..Self::default()
    }
  }

  pub fn published(&self) -> Vec<Message> {
    self.messages.lock().clone()
  }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
  async fn publish(&self, message: &Message) -> Result<(), PublishError> {
    if let Some(gate) = &self.gate {
      gate
        .acquire()
        .await
        .map_err(|e| PublishError::Broker(e.to_string()))?
        .forget();
    }
    if self.fail.load(Ordering::SeqCst) {
      return Err(PublishError::Broker("channel closed".to_string()));
    }
    self.messages.lock().push(message.clone());
    Ok(())
  }
}

// --- Service harness ---

pub struct Harness {
  pub catalog: Arc<StubCatalog>,
  pub repository: Arc<RecordingRepository>,
  pub cache: Arc<ScriptedCache>,
  pub publisher: Arc<RecordingPublisher>,
  pub service: Arc<OrderService>,
  pub worker: Option<DispatchWorker>,
  pub failures: FailureReceiver,
}

impl Harness {
  pub fn new(catalog: StubCatalog, cache: ScriptedCache, publisher: RecordingPublisher) -> Self {
    Self::with_policy(catalog, cache, publisher, ListingCachePolicy::StaleUntilExpiry)
  }

  pub fn with_policy(
    catalog: StubCatalog,
    cache: ScriptedCache,
    publisher: RecordingPublisher,
    listing_policy: ListingCachePolicy,
  ) -> Self {
    setup_tracing();
    let catalog = Arc::new(catalog);
    let repository = Arc::new(RecordingRepository::default());
    let cache = Arc::new(cache);
    let publisher = Arc::new(publisher);
    let (events, worker, failures) = spawn_dispatcher(publisher.clone(), 16);

    let settings = OrderSettings {
      listing_policy,
      ..OrderSettings::default()
    };
    let service = Arc::new(OrderService::new(OrderPorts {
      catalog: catalog.clone(),
      repository: repository.clone(),
      cache: cache.clone(),
      events,
      settings: Arc::new(settings),
    }));

    Self {
      catalog,
      repository,
      cache,
      publisher,
      service,
      worker: Some(worker),
      failures,
    }
  }

  pub fn healthy() -> Self {
    Self::new(StubCatalog::found(), ScriptedCache::default(), RecordingPublisher::default())
  }

  /// Waits for every queued event to be published.
  pub async fn drain_events(&mut self) -> order_service::events::DispatchReport {
    match self.worker.take() {
      Some(worker) => worker.shutdown().await,
      None => Default::default(),
    }
  }
}
