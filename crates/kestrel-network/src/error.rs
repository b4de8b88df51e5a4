//! Network errors.

/// Errors returned by the object network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
  /// The network explicitly denied access.
  #[error("access denied: {reason}")]
  AccessDenied { reason: String },

  /// The container or object does not exist.
  #[error("not found: {what}")]
  NotFound { what: String },

  /// Any other transport or protocol failure.
  #[error("transport error: {message}")]
  Transport { message: String },
}

impl NetworkError {
  pub fn access_denied(reason: impl Into<String>) -> Self {
    Self::AccessDenied {
      reason: reason.into(),
    }
  }

  pub fn not_found(what: impl Into<String>) -> Self {
    Self::NotFound { what: what.into() }
  }

  pub fn transport(message: impl Into<String>) -> Self {
    Self::Transport {
      message: message.into(),
    }
  }
}
