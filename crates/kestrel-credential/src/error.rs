//! Credential errors.

/// Errors that can occur while resolving credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
  /// The credential is of no recognized kind.
  #[error("no token provided")]
  NoToken,

  /// The operation needs a delegated bearer token and none was supplied.
  #[error("no bearer token provided")]
  NoBearerToken,

  /// No account is available to sign the request.
  #[error("no gate account for object")]
  NoGateAccount,

  /// Key material could not be decoded.
  #[error("invalid key: {message}")]
  InvalidKey { message: String },
}
