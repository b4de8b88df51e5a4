//! Emitter trait and implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::event::{Event, Payload, Topic};

/// Errors returned by an emitter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
  /// The observer is gone.
  #[error("emitter closed")]
  Closed,

  /// The payload does not fit the topic.
  #[error("unexpected payload for topic {topic}")]
  UnexpectedPayload { topic: Topic },

  /// Records must be persisted but no store is configured.
  #[error("no database configured")]
  NoDatabase,

  #[error("failed to persist event: {message}")]
  Persistence { message: String },
}

/// Forwards events to an external observer.
///
/// Implementations decide what to do with them (log, broadcast to a UI,
/// persist, ignore).
#[async_trait]
pub trait Emitter: Send + Sync {
  async fn emit(&self, topic: Topic, payload: &Payload) -> Result<(), EmitError>;
}

/// An emitter that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

#[async_trait]
impl Emitter for NoopEmitter {
  async fn emit(&self, _topic: Topic, _payload: &Payload) -> Result<(), EmitError> {
    Ok(())
  }
}

/// An emitter that writes every event to the log.
#[derive(Debug, Clone, Default)]
pub struct LogEmitter;

#[async_trait]
impl Emitter for LogEmitter {
  async fn emit(&self, topic: Topic, payload: &Payload) -> Result<(), EmitError> {
    let payload = serde_json::to_string(payload).unwrap_or_else(|e| format!("<unserializable: {}>", e));
    info!(topic = %topic, %payload, "event emitted");
    Ok(())
  }
}

/// An emitter that sends events to an unbounded channel.
///
/// Emission never waits on the consumer. Fails with [`EmitError::Closed`] once
/// the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
  sender: mpsc::UnboundedSender<Event>,
}

impl ChannelEmitter {
  pub fn new(sender: mpsc::UnboundedSender<Event>) -> Self {
    Self { sender }
  }

  /// Create an emitter together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

#[async_trait]
impl Emitter for ChannelEmitter {
  async fn emit(&self, topic: Topic, payload: &Payload) -> Result<(), EmitError> {
    self
      .sender
      .send(Event {
        topic,
        payload: payload.clone(),
      })
      .map_err(|_| EmitError::Closed)
  }
}
