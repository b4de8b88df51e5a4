//! Kestrel Store
//!
//! Bucketed key-value persistence. Kestrel archives every delivered
//! notification record here, under [`NOTIFICATION_BUCKET`] and keyed by the
//! record identifier.
//!
//! [`FsStore`] keeps one file per key on disk; [`MemoryStore`] is for tests
//! and short-lived processes.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Bucket holding archived notification records.
pub const NOTIFICATION_BUCKET: &str = "notifications";

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested key was not found.
  #[error("not found: {bucket}/{key}")]
  NotFound { bucket: String, key: String },

  /// The bucket or key cannot be used as a storage name.
  #[error("invalid name: '{0}'")]
  InvalidName(String),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Bucketed key-value storage.
#[async_trait]
pub trait Store: Send + Sync {
  /// Store a value, replacing any previous value under the same key.
  async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

  /// Retrieve a value.
  async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

  /// All entries of a bucket, ordered by key. An unknown bucket is empty.
  async fn list(&self, bucket: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

  /// Delete a value.
  async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}
