//! Mapping of network object headers to descriptors.

use kestrel_network::{ATTRIBUTE_CONTENT_TYPE, ATTRIBUTE_FILE_NAME, ATTRIBUTE_TIMESTAMP, ObjectHeader};
use kestrel_types::{ContainerId, ObjectDescriptor};

use crate::error::ObjectError;

/// Attribute holding the hex payload checksum, empty when the header has none.
pub const PAYLOAD_CHECKSUM_ATTRIBUTE: &str = "payload_checksum";

/// Describe an object from its header.
///
/// `Timestamp`, `Content-Type` and `FileName` fill the matching descriptor
/// fields. Every attribute is also copied into the attribute map as is.
pub fn describe(container: ContainerId, header: &ObjectHeader) -> Result<ObjectDescriptor, ObjectError> {
  let id = header.id.ok_or(ObjectError::MissingObjectId)?;

  let mut descriptor = ObjectDescriptor {
    parent_id: container.to_string(),
    id: id.to_string(),
    size: header.payload_size,
    ..Default::default()
  };

  for attribute in &header.attributes {
    match attribute.key.as_str() {
      ATTRIBUTE_TIMESTAMP => {
        descriptor.created_at =
          attribute
            .value
            .parse()
            .map_err(|e: std::num::ParseIntError| ObjectError::InvalidAttribute {
              key: attribute.key.clone(),
              value: attribute.value.clone(),
              message: e.to_string(),
            })?;
      }
      ATTRIBUTE_CONTENT_TYPE => descriptor.content_type = attribute.value.clone(),
      ATTRIBUTE_FILE_NAME => descriptor.name = attribute.value.clone(),
      _ => {}
    }
    descriptor
      .attributes
      .insert(attribute.key.clone(), attribute.value.clone());
  }

  let checksum = header
    .payload_checksum
    .as_ref()
    .map(|c| c.to_string())
    .unwrap_or_default();
  descriptor
    .attributes
    .insert(PAYLOAD_CHECKSUM_ATTRIBUTE.to_string(), checksum);

  Ok(descriptor)
}
