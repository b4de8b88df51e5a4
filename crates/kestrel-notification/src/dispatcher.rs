//! Notification dispatcher with a single drain task.
//!
//! The `Dispatcher` owns a bounded mpsc channel and the cancellation token that
//! scopes it. Producers call [`Notifier::queue`]; the task started by
//! [`Dispatcher::listen_and_emit`] receives records one at a time and forwards
//! them to the emitter.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use kestrel_emitter::{Emitter, Payload, Topic};
use kestrel_types::{NotificationKind, NotificationRecord, Severity};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::DispatchConfig;
use crate::error::DispatchError;

/// Capacity of the notification queue. A producer waits until the drain task
/// has taken the previous record.
pub const QUEUE_CAPACITY: usize = 1;

/// Creates and queues notification records.
#[async_trait]
pub trait Notifier: Send + Sync {
  /// Build an unread record addressed to this notifier's recipient.
  fn notification(
    &self,
    title: &str,
    description: &str,
    severity: Severity,
    kind: NotificationKind,
  ) -> NotificationRecord;

  /// A fresh, unique record identifier.
  fn generate_identifier(&self) -> String;

  /// Queue a record for delivery.
  async fn queue(&self, record: NotificationRecord) -> Result<(), DispatchError>;
}

/// Queues notification records and delivers them in order.
///
/// # Usage
///
/// ```ignore
/// let dispatcher = Dispatcher::new(emitter, DispatchConfig::default());
/// dispatcher.listen_and_emit()?;
///
/// let record = dispatcher.notification("Upload", "done", Severity::Success, NotificationKind::Toast);
/// dispatcher.queue(record).await?;
///
/// dispatcher.end();
/// dispatcher.wait().await?;
/// ```
pub struct Dispatcher {
  sender: mpsc::Sender<NotificationRecord>,
  receiver: Mutex<Option<mpsc::Receiver<NotificationRecord>>>,
  task: Mutex<Option<JoinHandle<Result<(), DispatchError>>>>,
  cancel: CancellationToken,
  emitter: Arc<dyn Emitter>,
  config: DispatchConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Dispatcher {
  pub fn new(emitter: Arc<dyn Emitter>, config: DispatchConfig) -> Self {
    let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
    Self {
      sender,
      receiver: Mutex::new(Some(receiver)),
      task: Mutex::new(None),
      cancel: CancellationToken::new(),
      emitter,
      config,
    }
  }

  pub fn config(&self) -> &DispatchConfig {
    &self.config
  }

  /// Start the drain task on the current tokio runtime.
  ///
  /// The task runs until [`end`](Self::end) is called, every sender is gone,
  /// or the emitter fails. Only one task can ever be started per dispatcher.
  pub fn listen_and_emit(&self) -> Result<(), DispatchError> {
    let Some(receiver) = lock(&self.receiver).take() else {
      return Err(DispatchError::AlreadyListening);
    };

    let handle = tokio::spawn(drain(
      receiver,
      self.emitter.clone(),
      self.cancel.clone(),
      self.config.heartbeat_interval,
    ));
    *lock(&self.task) = Some(handle);
    Ok(())
  }

  /// Stop delivering. Records queued afterwards are rejected.
  pub fn end(&self) {
    info!("ending notification dispatch");
    self.cancel.cancel();
  }

  pub fn is_ended(&self) -> bool {
    self.cancel.is_cancelled()
  }

  /// Wait for the drain task to finish and return how it ended.
  ///
  /// Returns immediately when no task was started or it was already awaited.
  pub async fn wait(&self) -> Result<(), DispatchError> {
    let handle = lock(&self.task).take();
    match handle {
      Some(handle) => handle.await?,
      None => Ok(()),
    }
  }
}

#[async_trait]
impl Notifier for Dispatcher {
  fn notification(
    &self,
    title: &str,
    description: &str,
    severity: Severity,
    kind: NotificationKind,
  ) -> NotificationRecord {
    NotificationRecord::new(self.generate_identifier(), title, description, severity, kind)
      .with_user(self.config.recipient.clone())
  }

  fn generate_identifier(&self) -> String {
    uuid::Uuid::new_v4().to_string()
  }

  async fn queue(&self, record: NotificationRecord) -> Result<(), DispatchError> {
    debug!(notification_id = %record.id, severity = %record.severity, "queueing notification");

    tokio::select! {
      biased;
      _ = self.cancel.cancelled() => Err(DispatchError::NoListener),
      sent = self.sender.send(record) => sent.map_err(|_| DispatchError::NoListener),
    }
  }
}

async fn deliver(emitter: &dyn Emitter, record: NotificationRecord) -> Result<(), DispatchError> {
  let notification_id = record.id.clone();
  let payload = Payload::Notification(record);
  if let Err(e) = emitter.emit(Topic::NotificationMessage, &payload).await {
    error!(%notification_id, error = %e, "failed to emit notification");
    return Err(e.into());
  }
  debug!(%notification_id, "notification emitted");
  Ok(())
}

async fn drain(
  mut receiver: mpsc::Receiver<NotificationRecord>,
  emitter: Arc<dyn Emitter>,
  cancel: CancellationToken,
  heartbeat: std::time::Duration,
) -> Result<(), DispatchError> {
  info!("notification listener started");

  let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  let result = loop {
    tokio::select! {
      _ = cancel.cancelled() => {
        info!("notification listener cancelled");
        // Records accepted before the end are still delivered.
        receiver.close();
        let mut flushed = Ok(());
        while let Ok(record) = receiver.try_recv() {
          flushed = deliver(emitter.as_ref(), record).await;
          if flushed.is_err() {
            break;
          }
        }
        break flushed;
      }
      record = receiver.recv() => {
        let Some(record) = record else {
          info!("notification queue closed");
          break Ok(());
        };
        if let Err(e) = deliver(emitter.as_ref(), record).await {
          break Err(e);
        }
      }
      _ = ticker.tick() => {
        debug!("notification listener alive");
      }
    }
  };

  // Producers fail fast once nobody drains the queue.
  cancel.cancel();
  result
}
