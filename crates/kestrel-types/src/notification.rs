use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Category of a notification, used by observers to pick styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Success,
  Info,
  Warning,
  Error,
}

impl Severity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Severity::Success => "success",
      Severity::Info => "info",
      Severity::Warning => "warning",
      Severity::Error => "error",
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How an observer should present a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  /// Transient popup.
  Toast,
  /// Kept in the notification list until read.
  Notification,
  /// Offers to copy something to the clipboard.
  Clipboard,
}

/// A human-readable status message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
  pub id: String,
  /// Recipient, used to scope archived records.
  pub user: String,
  pub title: String,
  pub description: String,
  pub severity: Severity,
  pub kind: NotificationKind,
  #[serde(default)]
  pub meta: HashMap<String, String>,
  /// RFC 3339 creation time.
  pub created_at: String,
  #[serde(default)]
  pub mark_read: bool,
}

impl NotificationRecord {
  /// Create an unread record stamped with the current time.
  pub fn new(
    id: impl Into<String>,
    title: impl Into<String>,
    description: impl Into<String>,
    severity: Severity,
    kind: NotificationKind,
  ) -> Self {
    Self {
      id: id.into(),
      user: String::new(),
      title: title.into(),
      description: description.into(),
      severity,
      kind,
      meta: HashMap::new(),
      created_at: Utc::now().to_rfc3339(),
      mark_read: false,
    }
  }

  pub fn with_user(mut self, user: impl Into<String>) -> Self {
    self.user = user.into();
    self
  }

  pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.meta.insert(key.into(), value.into());
    self
  }
}
