// order_service/src/ports/publisher.rs

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

pub const ORDERS_EXCHANGE: &str = "orders_exchange";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("failed to serialize event payload: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("unknown exchange '{0}'")]
  UnknownExchange(String),

  #[error("broker error: {0}")]
  Broker(String),
}

/// A serialized event addressed to a topic exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub exchange: String,
  pub routing_key: String,
  pub content_type: String,
  pub body: Vec<u8>,
}

impl Message {
  /// JSON-encodes `payload` for `exchange` under `routing_key`.
  pub fn json<T: Serialize + ?Sized>(
    exchange: &str,
    routing_key: &str,
    payload: &T,
  ) -> Result<Self, PublishError> {
    Ok(Self {
      exchange: exchange.to_string(),
      routing_key: routing_key.to_string(),
      content_type: JSON_CONTENT_TYPE.to_string(),
      body: serde_json::to_vec(payload)?,
    })
  }
}

/// Sends a message to its exchange. `Ok` means the send was accepted, not that anyone consumed it.
#[async_trait]
pub trait EventPublisher: Send + Sync {
  async fn publish(&self, message: &Message) -> Result<(), PublishError>;
}

struct Binding {
  pattern: String,
  queue: mpsc::Sender<Message>,
}

/// In-process topic exchange.
///
/// Binding patterns follow AMQP topic rules over dot-separated words: `*` matches
/// exactly one word, `#` matches zero or more. Messages nobody is bound to are
/// dropped. A bound queue that is full or closed misses the message; closed
/// queues are unbound.
pub struct TopicExchange {
  name: String,
  bindings: Mutex<Vec<Binding>>,
}

impl TopicExchange {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      bindings: Mutex::new(Vec::new()),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Binds a new queue of `capacity` messages to `pattern`.
  pub fn bind(&self, pattern: impl Into<String>, capacity: usize) -> mpsc::Receiver<Message> {
    let (queue, rx) = mpsc::channel(capacity);
    self.bindings.lock().push(Binding {
      pattern: pattern.into(),
      queue,
    });
    rx
  }

  /// Queues the message for every matching binding and returns how many accepted it.
  fn route(&self, message: &Message) -> usize {
    let mut bindings = self.bindings.lock();
    bindings.retain(|b| !b.queue.is_closed());
    bindings
      .iter()
      .filter(|b| topic_matches(&b.pattern, &message.routing_key))
      .filter(|b| b.queue.try_send(message.clone()).is_ok())
      .count()
  }
}

#[async_trait]
impl EventPublisher for TopicExchange {
  #[instrument(name = "exchange::publish", skip(self, message), fields(exchange = %self.name, routing_key = %message.routing_key))]
  async fn publish(&self, message: &Message) -> Result<(), PublishError> {
    if message.exchange != self.name {
      return Err(PublishError::UnknownExchange(message.exchange.clone()));
    }
    let delivered = self.route(message);
    debug!(delivered, bytes = message.body.len(), "Message routed.");
    Ok(())
  }
}

/// AMQP topic matching of `routing_key` against `pattern`.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
  let pattern: Vec<&str> = pattern.split('.').collect();
  let key: Vec<&str> = routing_key.split('.').collect();
  matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
  match pattern.split_first() {
    None => key.is_empty(),
    Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
    Some((word, rest)) => match key.split_first() {
      Some((key_word, key_rest)) => (*word == "*" || word == key_word) && matches_words(rest, key_rest),
      None => false,
    },
  }
}
