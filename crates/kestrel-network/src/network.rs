//! The object network capability.

use async_trait::async_trait;
use futures::stream::BoxStream;
use kestrel_credential::{BearerToken, Signer};
use kestrel_types::{ContainerId, ObjectId};

use crate::error::NetworkError;
use crate::header::ObjectHeader;

/// Stream of object identifiers returned by a search.
pub type ObjectIdStream = BoxStream<'static, Result<ObjectId, NetworkError>>;

/// Sizing parameters published by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
  /// Largest payload a single network object may carry.
  pub max_object_size: u64,
  pub current_epoch: u64,
  pub homomorphic_hashing_disabled: bool,
}

/// Options for opening a payload writer.
#[derive(Debug, Clone)]
pub struct PutOptions {
  /// Payloads larger than this are sliced into parts.
  pub payload_limit: u64,
  pub current_epoch: u64,
  pub bearer: BearerToken,
  pub homomorphic_checksum: bool,
}

/// Filters applied to an object search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
  root_only: bool,
  attributes: Vec<(String, String)>,
}

impl SearchFilters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Only match root objects, skipping the parts of sliced ones.
  pub fn add_root_filter(&mut self) -> &mut Self {
    self.root_only = true;
    self
  }

  pub fn add_attribute_filter(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.attributes.push((key.into(), value.into()));
    self
  }

  pub fn matches(&self, header: &ObjectHeader) -> bool {
    if self.root_only && !header.is_root() {
      return false;
    }
    self
      .attributes
      .iter()
      .all(|(key, value)| header.attribute(key) == Some(value.as_str()))
  }
}

/// Reads an object payload from the network.
#[async_trait]
pub trait PayloadReader: Send {
  /// Read into `buf`, returning `0` once the payload is exhausted.
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, NetworkError>;
}

/// Writes an object payload to the network.
///
/// Must be finished exactly once; finishing stores the object and returns its
/// header as stored, carrying the identifier and checksums the network
/// assigned.
#[async_trait]
pub trait PayloadWriter: Send {
  async fn write(&mut self, buf: &[u8]) -> Result<usize, NetworkError>;

  async fn finish(self: Box<Self>) -> Result<ObjectHeader, NetworkError>;
}

/// Connection to the distributed object network.
///
/// Implementations are shared across concurrent operations and handle their
/// own synchronization.
#[async_trait]
pub trait ObjectNetwork: Send + Sync {
  async fn network_info(&self) -> Result<NetworkInfo, NetworkError>;

  async fn head(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<ObjectHeader, NetworkError>;

  /// Open a payload reader, returning the object header alongside it.
  async fn get_init(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(ObjectHeader, Box<dyn PayloadReader>), NetworkError>;

  /// Open a payload writer for a new object described by `header`.
  async fn put_init(
    &self,
    header: ObjectHeader,
    signer: &Signer,
    options: PutOptions,
  ) -> Result<Box<dyn PayloadWriter>, NetworkError>;

  async fn delete(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(), NetworkError>;

  /// Search a container. Pagination is handled by the implementation.
  async fn search(
    &self,
    container: ContainerId,
    signer: &Signer,
    bearer: &BearerToken,
    filters: SearchFilters,
  ) -> Result<ObjectIdStream, NetworkError>;
}
