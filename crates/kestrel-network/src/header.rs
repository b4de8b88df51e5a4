//! Object headers and attributes.

use std::fmt;

use kestrel_types::{ContainerId, ObjectId, OwnerId};
use serde::{Deserialize, Serialize};

/// Creation time in epoch seconds.
pub const ATTRIBUTE_TIMESTAMP: &str = "Timestamp";
pub const ATTRIBUTE_CONTENT_TYPE: &str = "Content-Type";
pub const ATTRIBUTE_FILE_NAME: &str = "FileName";
pub const ATTRIBUTE_FILE_PATH: &str = "FilePath";
pub const ATTRIBUTE_EXPIRATION_EPOCH: &str = "ExpirationEpoch";

/// A key/value pair attached to an object header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub key: String,
  pub value: String,
}

impl Attribute {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: value.into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
  Regular,
  /// Root of a sliced object; its payload lives in child parts.
  Link,
  /// A slice of a larger object's payload.
  Part,
}

/// A SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(pub [u8; 32]);

impl fmt::Display for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&hex::encode(self.0))
  }
}

impl fmt::Debug for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Checksum({})", self)
  }
}

/// Object metadata as stored by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHeader {
  /// Assigned by the network when the object is finalized.
  pub id: Option<ObjectId>,
  pub container: ContainerId,
  pub owner: OwnerId,
  pub object_type: ObjectType,
  pub creation_epoch: u64,
  pub payload_size: u64,
  pub payload_checksum: Option<Checksum>,
  pub homomorphic_checksum: Option<Checksum>,
  pub attributes: Vec<Attribute>,
  /// Root object this header is a part of.
  pub parent: Option<ObjectId>,
}

impl ObjectHeader {
  /// An empty regular object header for a new upload.
  pub fn new(container: ContainerId, owner: OwnerId, creation_epoch: u64) -> Self {
    Self {
      id: None,
      container,
      owner,
      object_type: ObjectType::Regular,
      creation_epoch,
      payload_size: 0,
      payload_checksum: None,
      homomorphic_checksum: None,
      attributes: Vec::new(),
      parent: None,
    }
  }

  pub fn attribute(&self, key: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|a| a.key == key)
      .map(|a| a.value.as_str())
  }

  /// Whether the object is a root object rather than a slice of one.
  pub fn is_root(&self) -> bool {
    self.parent.is_none() && self.object_type != ObjectType::Part
  }
}
