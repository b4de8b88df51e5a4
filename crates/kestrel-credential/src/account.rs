//! Gate accounts and request signers.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey};
use kestrel_types::OwnerId;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::CredentialError;

/// Derive the owner identity of an ed25519 public key.
pub(crate) fn owner_of(public_key: &[u8; 32]) -> OwnerId {
  OwnerId::from_bytes(Sha256::digest(public_key).into())
}

/// The local account whose key signs network requests.
#[derive(Clone)]
pub struct GateAccount {
  key: SigningKey,
}

impl GateAccount {
  pub fn new(key: SigningKey) -> Self {
    Self { key }
  }

  /// Generate a fresh random account.
  pub fn generate() -> Self {
    Self::new(SigningKey::generate(&mut OsRng))
  }

  /// Load an account from a 32-byte secret seed.
  pub fn from_seed(seed: &[u8]) -> Result<Self, CredentialError> {
    let seed: [u8; 32] = seed
      .try_into()
      .map_err(|_| CredentialError::InvalidKey {
        message: format!("expected 32 seed bytes, got {}", seed.len()),
      })?;
    Ok(Self::new(SigningKey::from_bytes(&seed)))
  }

  pub fn signing_key(&self) -> &SigningKey {
    &self.key
  }

  pub fn public_key(&self) -> [u8; 32] {
    self.key.verifying_key().to_bytes()
  }

  pub fn owner(&self) -> OwnerId {
    owner_of(&self.public_key())
  }

  /// A signer for network requests made on behalf of this account.
  pub fn signer(&self) -> Signer {
    Signer {
      key: self.key.clone(),
    }
  }
}

impl fmt::Debug for GateAccount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GateAccount")
      .field("owner", &self.owner())
      .finish_non_exhaustive()
  }
}

/// Signs network requests.
#[derive(Clone)]
pub struct Signer {
  key: SigningKey,
}

impl Signer {
  pub fn sign(&self, message: &[u8]) -> Vec<u8> {
    self.key.sign(message).to_bytes().to_vec()
  }

  pub fn public_key(&self) -> [u8; 32] {
    self.key.verifying_key().to_bytes()
  }

  pub fn owner(&self) -> OwnerId {
    owner_of(&self.public_key())
  }
}

impl fmt::Debug for Signer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Signer")
      .field("owner", &self.owner())
      .finish_non_exhaustive()
  }
}
