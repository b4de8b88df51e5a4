use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::{Store, StoreError};

/// Filesystem-based store.
///
/// Each value is stored at `{base_path}/{bucket}/{key}`. Bucket directories are
/// created on first write.
pub struct FsStore {
  base_path: PathBuf,
}

impl FsStore {
  /// Create a new filesystem store with the given base path.
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StoreError> {
    validate_name(bucket)?;
    Ok(self.base_path.join(bucket))
  }

  fn key_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
    validate_name(key)?;
    Ok(self.bucket_path(bucket)?.join(key))
  }
}

/// Names map to single path components.
fn validate_name(name: &str) -> Result<(), StoreError> {
  let invalid = name.is_empty()
    || name.starts_with('.')
    || name.contains(['/', '\\'])
    || name.contains('\0');
  if invalid {
    return Err(StoreError::InvalidName(name.to_string()));
  }
  Ok(())
}

fn map_not_found(bucket: &str, key: &str, e: std::io::Error) -> StoreError {
  if e.kind() == std::io::ErrorKind::NotFound {
    StoreError::NotFound {
      bucket: bucket.to_string(),
      key: key.to_string(),
    }
  } else {
    StoreError::Io(e)
  }
}

#[async_trait]
impl Store for FsStore {
  async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
    let path = self.key_path(bucket, key)?;
    fs::create_dir_all(self.bucket_path(bucket)?).await?;

    let mut file = File::create(path).await?;
    file.write_all(&value).await?;
    file.flush().await?;
    Ok(())
  }

  async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
    let path = self.key_path(bucket, key)?;
    fs::read(&path).await.map_err(|e| map_not_found(bucket, key, e))
  }

  async fn list(&self, bucket: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
    let path = self.bucket_path(bucket)?;
    let mut entries = match fs::read_dir(&path).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(StoreError::Io(e)),
    };

    let mut values = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      if !entry.file_type().await?.is_file() {
        continue;
      }
      let Ok(key) = entry.file_name().into_string() else {
        continue;
      };
      let value = fs::read(entry.path()).await?;
      values.push((key, value));
    }
    values.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(values)
  }

  async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
    let path = self.key_path(bucket, key)?;
    fs::remove_file(&path)
      .await
      .map_err(|e| map_not_found(bucket, key, e))
  }
}
