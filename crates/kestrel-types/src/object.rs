use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata of a stored object, as reported to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
  /// Identifier of the container holding the object.
  pub parent_id: String,
  pub id: String,
  /// Display name, taken from the `FileName` attribute.
  pub name: String,
  pub content_type: String,
  /// Payload size in bytes.
  pub size: u64,
  /// Creation time in epoch seconds, `0` when the object carries no timestamp.
  pub created_at: i64,
  pub attributes: HashMap<String, String>,
}

impl ObjectDescriptor {
  /// A bare descriptor keyed by container and object identifier.
  pub fn keyed(parent_id: impl Into<String>, id: impl Into<String>) -> Self {
    Self {
      parent_id: parent_id.into(),
      id: id.into(),
      ..Default::default()
    }
  }

  /// Both identifiers are present.
  pub fn is_resolved(&self) -> bool {
    !self.parent_id.is_empty() && !self.id.is_empty()
  }
}
