//! Event topics and payloads.

use std::fmt;

use kestrel_types::{NotificationRecord, ObjectDescriptor};
use serde::Serialize;

/// Topic an event is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
  ObjectAddUpdate,
  ObjectRemoveUpdate,
  ObjectFailed,
  NotificationMessage,
  ProgressMessage,
}

impl Topic {
  pub fn as_str(&self) -> &'static str {
    match self {
      Topic::ObjectAddUpdate => "object_add_update",
      Topic::ObjectRemoveUpdate => "object_remove_update",
      Topic::ObjectFailed => "object_failed",
      Topic::NotificationMessage => "notification_message",
      Topic::ProgressMessage => "progress_message",
    }
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Transfer progress of a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressMessage {
  pub title: String,
  /// Percentage in `0..=100`, or `0` while the total is unknown.
  pub progress: u8,
  pub transferred: u64,
  pub total: Option<u64>,
}

/// Data carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
  Object(ObjectDescriptor),
  Notification(NotificationRecord),
  Progress(ProgressMessage),
}

/// A topic and its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
  pub topic: Topic,
  pub payload: Payload,
}
