use std::time::Duration;

/// Configuration for an [`ObjectExecutor`](crate::ObjectExecutor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
  /// Upper bound on a delete round trip.
  pub delete_timeout: Duration,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      delete_timeout: Duration::from_secs(60),
    }
  }
}
