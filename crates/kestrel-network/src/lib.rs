//! Kestrel Network
//!
//! The boundary between kestrel and the distributed object network.
//!
//! The [`ObjectNetwork`] trait is the connection-pool capability the object
//! executor talks to. Every request is signed by a [`Signer`] and carries the
//! bearer token resolved from the caller's credential. Payloads move through
//! [`PayloadReader`] and [`PayloadWriter`] streams; a writer slices large
//! payloads on its own and reports the final object identifier when finished.
//!
//! [`MemoryNetwork`] keeps everything in process and is used by tests and the
//! command line demo.
//!
//! [`Signer`]: kestrel_credential::Signer

mod error;
mod header;
mod memory;
mod network;

pub use error::NetworkError;
pub use header::{
  ATTRIBUTE_CONTENT_TYPE, ATTRIBUTE_EXPIRATION_EPOCH, ATTRIBUTE_FILE_NAME, ATTRIBUTE_FILE_PATH,
  ATTRIBUTE_TIMESTAMP, Attribute, Checksum, ObjectHeader, ObjectType,
};
pub use memory::{MemoryNetwork, MemoryNetworkConfig};
pub use network::{
  NetworkInfo, ObjectIdStream, ObjectNetwork, PayloadReader, PayloadWriter, PutOptions,
  SearchFilters,
};
