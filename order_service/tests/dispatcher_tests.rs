// order_service/tests/dispatcher_tests.rs
mod common;

use common::{setup_tracing, RecordingPublisher};
use order_service::events::{spawn_dispatcher, DispatchError};
use order_service::ports::{Message, PublishError, TopicExchange, ORDERS_EXCHANGE};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

fn event(routing_key: &str, n: u32) -> Message {
  Message::json(ORDERS_EXCHANGE, routing_key, &json!({ "n": n })).unwrap()
}

#[tokio::test]
async fn publishes_in_enqueue_order() {
  setup_tracing();
  let publisher = Arc::new(RecordingPublisher::default());
  let (dispatcher, worker, _failures) = spawn_dispatcher(publisher.clone(), 8);

  for n in 0..3 {
    dispatcher.dispatch(event("order.created", n)).unwrap();
  }
  let report = worker.shutdown().await;

  assert_eq!(report.delivered, 3);
  assert_eq!(report.failed, 0);
  let bodies: Vec<serde_json::Value> = publisher
    .published()
    .iter()
    .map(|m| serde_json::from_slice(&m.body).unwrap())
    .collect();
  assert_eq!(bodies, vec![json!({"n": 0}), json!({"n": 1}), json!({"n": 2})]);
}

#[tokio::test]
async fn full_queue_rejects_instead_of_blocking() {
  setup_tracing();
  let gate = Arc::new(Semaphore::new(0));
  let publisher = Arc::new(RecordingPublisher::gated(gate.clone()));
  let (dispatcher, worker, _failures) = spawn_dispatcher(publisher.clone(), 1);

  let results: Vec<_> = (0..3).map(|n| dispatcher.dispatch(event("order.created", n))).collect();
  let accepted = results.iter().filter(|r| r.is_ok()).count();

  assert!((1..=2).contains(&accepted), "accepted {accepted}");
  assert!(results.contains(&Err(DispatchError::QueueFull)));

  gate.add_permits(10);
  let report = worker.shutdown().await;
  assert_eq!(report.delivered as usize, accepted);
}

#[tokio::test]
async fn shutdown_drains_queue_then_refuses_new_events() {
  setup_tracing();
  let publisher = Arc::new(RecordingPublisher::default());
  let (dispatcher, worker, _failures) = spawn_dispatcher(publisher.clone(), 8);

  dispatcher.dispatch(event("order.created", 1)).unwrap();
  dispatcher.dispatch(event("order.created", 2)).unwrap();
  let report = worker.shutdown().await;

  assert_eq!(report.delivered, 2);
  assert_eq!(publisher.published().len(), 2);
  assert_eq!(dispatcher.dispatch(event("order.created", 3)), Err(DispatchError::Closed));
}

#[tokio::test]
async fn publish_failures_are_reported_once() {
  setup_tracing();
  let publisher = Arc::new(RecordingPublisher::failing());
  let (dispatcher, worker, mut failures) = spawn_dispatcher(publisher, 8);

  dispatcher.dispatch(event("order.created", 1)).unwrap();
  let report = worker.shutdown().await;

  assert_eq!(report, order_service::events::DispatchReport { delivered: 0, failed: 1 });
  let failure = failures.recv().await.unwrap();
  assert_eq!(failure.routing_key, "order.created");
  assert!(matches!(failure.error, PublishError::Broker(_)));
  assert!(failures.recv().await.is_none());
}

#[tokio::test]
async fn dropped_worker_keeps_publishing() {
  setup_tracing();
  let publisher = Arc::new(RecordingPublisher::default());
  let (dispatcher, worker, _failures) = spawn_dispatcher(publisher.clone(), 8);
  drop(worker);

  dispatcher.dispatch(event("order.created", 1)).unwrap();

  tokio::time::timeout(Duration::from_secs(2), async {
    while publisher.published().is_empty() {
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
  })
  .await
  .expect("event was not published after the worker handle was dropped");
}

#[tokio::test]
async fn routes_through_topic_exchange_bindings() {
  setup_tracing();
  let exchange = Arc::new(TopicExchange::new(ORDERS_EXCHANGE));
  let mut created = exchange.bind("order.created", 8);
  let mut everything = exchange.bind("order.#", 8);
  let mut payments = exchange.bind("payment.*", 8);
  let (dispatcher, worker, mut failures) = spawn_dispatcher(exchange.clone(), 8);

  dispatcher.dispatch(event("order.created", 1)).unwrap();
  dispatcher.dispatch(event("order.cancelled.by_user", 2)).unwrap();
  dispatcher
    .dispatch(Message::json("other_exchange", "order.created", &json!({})).unwrap())
    .unwrap();
  let report = worker.shutdown().await;

  assert_eq!(report.delivered, 2);
  assert_eq!(report.failed, 1);
  assert_eq!(created.recv().await.unwrap().routing_key, "order.created");
  assert!(created.try_recv().is_err());
  assert_eq!(everything.recv().await.unwrap().routing_key, "order.created");
  assert_eq!(everything.recv().await.unwrap().routing_key, "order.cancelled.by_user");
  assert!(payments.try_recv().is_err());

  let failure = failures.recv().await.unwrap();
  assert!(matches!(failure.error, PublishError::UnknownExchange(ref name) if name == "other_exchange"));
}
