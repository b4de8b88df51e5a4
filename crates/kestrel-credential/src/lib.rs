//! Kestrel Credential
//!
//! Credentials that authorize object operations on the storage network.
//!
//! A [`Credential`] is either a [`BearerToken`] delegated by the container
//! owner or a [`SessionToken`] held locally. [`resolve_bearer`] and
//! [`require_delegated`] turn a credential into the concrete token a network
//! request carries. A [`GateAccount`] is the local key that signs the request
//! itself.

mod account;
mod error;
mod resolver;
mod token;

pub use account::{GateAccount, Signer};
pub use error::CredentialError;
pub use resolver::{resolve_bearer, require_delegated};
pub use token::{BearerToken, Credential, Operation, SessionToken};
