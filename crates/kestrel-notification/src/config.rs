use std::time::Duration;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub struct DispatchConfig {
  /// Recipient stamped on every record the dispatcher creates.
  pub recipient: String,

  /// How often the drain task logs that it is still alive.
  pub heartbeat_interval: Duration,
}

impl Default for DispatchConfig {
  fn default() -> Self {
    Self {
      recipient: String::new(),
      heartbeat_interval: Duration::from_secs(10),
    }
  }
}

impl DispatchConfig {
  pub fn for_recipient(recipient: impl Into<String>) -> Self {
    Self {
      recipient: recipient.into(),
      ..Self::default()
    }
  }
}
