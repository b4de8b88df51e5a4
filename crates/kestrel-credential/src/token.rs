//! Bearer and session tokens.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use kestrel_types::{ContainerId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::account::owner_of;

const BEARER_DOMAIN: &[u8] = b"kestrel-bearer-v1";

/// Object operation a request performs, checked by access rules upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Get,
  Head,
  Put,
  Delete,
  Search,
  Range,
  RangeHash,
}

impl Operation {
  fn code(self) -> u8 {
    match self {
      Operation::Get => 1,
      Operation::Head => 2,
      Operation::Put => 3,
      Operation::Delete => 4,
      Operation::Search => 5,
      Operation::Range => 6,
      Operation::RangeHash => 7,
    }
  }
}

/// A token issued by a container owner, authorizing operations on one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
  /// Ed25519 public key of the issuer.
  pub issuer: [u8; 32],
  pub container: ContainerId,
  /// Last epoch in which the token is valid.
  pub expiry_epoch: u64,
  pub operations: Vec<Operation>,
  pub signature: Vec<u8>,
}

impl BearerToken {
  /// Issue and sign a token with the issuer's key.
  pub fn issue(
    issuer: &SigningKey,
    container: ContainerId,
    expiry_epoch: u64,
    operations: Vec<Operation>,
  ) -> Self {
    let mut token = Self {
      issuer: issuer.verifying_key().to_bytes(),
      container,
      expiry_epoch,
      operations,
      signature: Vec::new(),
    };
    token.signature = issuer.sign(&token.signed_body()).to_bytes().to_vec();
    token
  }

  /// Canonical bytes covered by the signature.
  fn signed_body(&self) -> Vec<u8> {
    let mut body = Vec::with_capacity(BEARER_DOMAIN.len() + 72 + self.operations.len());
    body.extend_from_slice(BEARER_DOMAIN);
    body.extend_from_slice(&self.issuer);
    body.extend_from_slice(self.container.as_bytes());
    body.extend_from_slice(&self.expiry_epoch.to_le_bytes());
    body.extend(self.operations.iter().map(|op| op.code()));
    body
  }

  /// Check the embedded signature against the issuer key.
  pub fn verify_signature(&self) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(&self.issuer) else {
      return false;
    };
    let Ok(signature) = Signature::from_slice(&self.signature) else {
      return false;
    };
    key.verify(&self.signed_body(), &signature).is_ok()
  }

  pub fn allows(&self, operation: Operation) -> bool {
    self.operations.contains(&operation)
  }

  pub fn is_expired(&self, current_epoch: u64) -> bool {
    current_epoch > self.expiry_epoch
  }

  /// Owner identity of the issuer.
  pub fn issuer_owner(&self) -> OwnerId {
    owner_of(&self.issuer)
  }
}

/// A locally held, non-delegated token scoped to one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
  /// Privately signed bearer token carried by the session.
  pub bearer: BearerToken,
  pub session_expiry_epoch: u64,
}

/// The credential supplied with an object operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
  /// Token delegated by a third party.
  Delegated(BearerToken),
  /// Locally held session token.
  Session(SessionToken),
  /// A credential kind this layer cannot use, such as a container session.
  Unrecognized { kind: String },
}

impl Credential {
  pub fn kind(&self) -> &str {
    match self {
      Credential::Delegated(_) => "delegated",
      Credential::Session(_) => "session",
      Credential::Unrecognized { kind } => kind,
    }
  }
}
