// order_service/src/events.rs

//! Bounded, supervised delivery of domain events.
//!
//! Requests hand messages to an `EventDispatcher` without waiting for the broker.
//! A single worker task publishes them, one attempt each. Failures are logged and
//! reported on a separate channel; they never reach the request that produced the
//! event. Delivery is at-most-once: messages still queued when the process dies
//! without `DispatchWorker::shutdown` are lost.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::ports::publisher::{EventPublisher, Message, PublishError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
  #[error("event queue is full")]
  QueueFull,

  #[error("event dispatcher is shut down")]
  Closed,
}

/// A publish attempt that failed. Reported once, never retried.
#[derive(Debug)]
pub struct PublishFailure {
  pub routing_key: String,
  pub error: PublishError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
  pub delivered: u64,
  pub failed: u64,
}

pub type FailureReceiver = mpsc::UnboundedReceiver<PublishFailure>;

/// Cheap, cloneable handle used by request paths to enqueue events.
#[derive(Clone)]
pub struct EventDispatcher {
  queue: mpsc::Sender<Message>,
}

impl EventDispatcher {
  /// Enqueues without waiting. Fails when the queue is at capacity or shut down.
  pub fn dispatch(&self, message: Message) -> Result<(), DispatchError> {
    self.queue.try_send(message).map_err(|e| match e {
      mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
      mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
    })
  }
}

/// Owner of the worker task.
pub struct DispatchWorker {
  shutdown: oneshot::Sender<()>,
  handle: JoinHandle<DispatchReport>,
}

impl DispatchWorker {
  /// Stops accepting events, publishes what is already queued, and reports totals.
  pub async fn shutdown(self) -> DispatchReport {
    let _ = self.shutdown.send(());
    match self.handle.await {
      Ok(report) => report,
      Err(e) => {
        warn!(error = %e, "Event dispatch worker ended abnormally.");
        DispatchReport::default()
      }
    }
  }
}

/// Starts the worker on the current Tokio runtime with a queue of `capacity` messages.
pub fn spawn_dispatcher(
  publisher: Arc<dyn EventPublisher>,
  capacity: usize,
) -> (EventDispatcher, DispatchWorker, FailureReceiver) {
  let (queue, rx) = mpsc::channel(capacity);
  let (failures_tx, failures_rx) = mpsc::unbounded_channel();
  let (shutdown_tx, shutdown_rx) = oneshot::channel();

  let span = tracing::info_span!("event_dispatch_worker", capacity);
  let handle = tokio::spawn(run_worker(publisher, rx, shutdown_rx, failures_tx).instrument(span));

  (
    EventDispatcher { queue },
    DispatchWorker {
      shutdown: shutdown_tx,
      handle,
    },
    failures_rx,
  )
}

async fn run_worker(
  publisher: Arc<dyn EventPublisher>,
  mut rx: mpsc::Receiver<Message>,
  mut shutdown: oneshot::Receiver<()>,
  failures: mpsc::UnboundedSender<PublishFailure>,
) -> DispatchReport {
  let mut report = DispatchReport::default();
  // A dropped DispatchWorker detaches the task; it then runs until every dispatcher is gone.
  let mut detached = false;

  loop {
    tokio::select! {
      biased;
      signal = &mut shutdown, if !detached => match signal {
        Ok(()) => {
          debug!("Shutdown requested, draining queued events.");
          rx.close();
          break;
        }
        Err(_) => detached = true,
      },
      next = rx.recv() => match next {
        Some(message) => publish_one(publisher.as_ref(), message, &failures, &mut report).await,
        None => break,
      },
    }
  }

  while let Some(message) = rx.recv().await {
    publish_one(publisher.as_ref(), message, &failures, &mut report).await;
  }

  info!(delivered = report.delivered, failed = report.failed, "Event dispatch worker stopped.");
  report
}

async fn publish_one(
  publisher: &dyn EventPublisher,
  message: Message,
  failures: &mpsc::UnboundedSender<PublishFailure>,
  report: &mut DispatchReport,
) {
  match publisher.publish(&message).await {
    Ok(()) => {
      report.delivered += 1;
      debug!(routing_key = %message.routing_key, "Event published.");
    }
    Err(error) => {
      report.failed += 1;
      warn!(routing_key = %message.routing_key, error = %error, "Publish failed; event dropped.");
      // Nobody listening for failures is fine; the warning above is the record.
      let _ = failures.send(PublishFailure {
        routing_key: message.routing_key,
        error,
      });
    }
  }
}
