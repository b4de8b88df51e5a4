//! Executor errors.

use kestrel_credential::CredentialError;
use kestrel_emitter::EmitError;
use kestrel_network::NetworkError;
use kestrel_notification::DispatchError;
use kestrel_transfer::{PipelineError, StreamError};
use kestrel_types::IdError;

/// Errors returned by object operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
  /// A container or object identifier could not be decoded.
  #[error("invalid identifier: {0}")]
  InvalidIdentifier(#[from] IdError),

  /// The credential carries no usable token.
  #[error("no token provided")]
  NoToken,

  /// The operation needs a delegated bearer token.
  #[error("no bearer token provided")]
  NoBearerToken,

  #[error("no gate account for object")]
  NoGateAccount,

  /// The network explicitly denied the request.
  #[error("access denied: {reason}")]
  AccessDenied { reason: String },

  /// The delegated token failed verification after upload.
  #[error("bearer token signature is not valid")]
  TokenSignatureInvalid,

  /// Any other network or stream failure, cancellation and timeouts included.
  #[error("transfer failed: {message}")]
  Transfer { message: String },

  #[error("no local stream supplied")]
  NoStream,

  #[error("object header carries no identifier")]
  MissingObjectId,

  #[error("invalid attribute '{key}' = '{value}': {message}")]
  InvalidAttribute {
    key: String,
    value: String,
    message: String,
  },

  #[error("emit error: {0}")]
  Emit(#[from] EmitError),

  #[error("dispatch error: {0}")]
  Dispatch(#[from] DispatchError),
}

impl ObjectError {
  pub fn transfer(message: impl Into<String>) -> Self {
    Self::Transfer {
      message: message.into(),
    }
  }

  pub(crate) fn cancelled() -> Self {
    Self::transfer("operation cancelled")
  }
}

impl From<CredentialError> for ObjectError {
  fn from(e: CredentialError) -> Self {
    match e {
      CredentialError::NoToken => Self::NoToken,
      CredentialError::NoBearerToken => Self::NoBearerToken,
      CredentialError::NoGateAccount | CredentialError::InvalidKey { .. } => Self::NoGateAccount,
    }
  }
}

impl From<NetworkError> for ObjectError {
  fn from(e: NetworkError) -> Self {
    match e {
      NetworkError::AccessDenied { reason } => Self::AccessDenied { reason },
      other => Self::transfer(other.to_string()),
    }
  }
}

impl From<StreamError> for ObjectError {
  fn from(e: StreamError) -> Self {
    match e {
      StreamError::Network(e) => e.into(),
      other => Self::transfer(other.to_string()),
    }
  }
}

impl From<PipelineError> for ObjectError {
  fn from(e: PipelineError) -> Self {
    match e {
      PipelineError::Credential(e) => e.into(),
      PipelineError::Network {
        source: NetworkError::AccessDenied { reason },
        ..
      } => Self::AccessDenied { reason },
      PipelineError::Network { stage, source } => Self::transfer(format!("{}: {}", stage, source)),
    }
  }
}
