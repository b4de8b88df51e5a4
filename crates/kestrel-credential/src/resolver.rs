//! Resolution of a credential into the token a request carries.

use tracing::debug;

use crate::error::CredentialError;
use crate::token::{BearerToken, Credential, Operation};

/// Resolve the bearer token carried by a credential.
///
/// Delegated tokens are checked before session tokens; both yield a usable
/// bearer token. Any other credential kind fails with
/// [`CredentialError::NoToken`].
pub fn resolve_bearer(
  credential: &Credential,
  operation: Operation,
) -> Result<&BearerToken, CredentialError> {
  let token = match credential {
    Credential::Delegated(token) => token,
    Credential::Session(session) => &session.bearer,
    Credential::Unrecognized { .. } => return Err(CredentialError::NoToken),
  };
  debug!(kind = credential.kind(), ?operation, "resolved bearer token");
  Ok(token)
}

/// Resolve a delegated bearer token, rejecting every other credential kind.
pub fn require_delegated(
  credential: &Credential,
  operation: Operation,
) -> Result<&BearerToken, CredentialError> {
  match credential {
    Credential::Delegated(token) => {
      debug!(?operation, "resolved delegated token");
      Ok(token)
    }
    Credential::Session(_) | Credential::Unrecognized { .. } => Err(CredentialError::NoBearerToken),
  }
}
