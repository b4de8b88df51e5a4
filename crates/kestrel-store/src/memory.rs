use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Store, StoreError};

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
  buckets: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn not_found(bucket: &str, key: &str) -> StoreError {
  StoreError::NotFound {
    bucket: bucket.to_string(),
    key: key.to_string(),
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
    self
      .buckets
      .write()
      .await
      .entry(bucket.to_string())
      .or_default()
      .insert(key.to_string(), value);
    Ok(())
  }

  async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
    self
      .buckets
      .read()
      .await
      .get(bucket)
      .and_then(|b| b.get(key))
      .cloned()
      .ok_or_else(|| not_found(bucket, key))
  }

  async fn list(&self, bucket: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
    Ok(
      self
        .buckets
        .read()
        .await
        .get(bucket)
        .map(|b| b.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default(),
    )
  }

  async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
    self
      .buckets
      .write()
      .await
      .get_mut(bucket)
      .and_then(|b| b.remove(key))
      .map(|_| ())
      .ok_or_else(|| not_found(bucket, key))
  }
}
