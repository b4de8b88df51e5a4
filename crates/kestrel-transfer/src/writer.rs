//! Remote payload writer setup.

use kestrel_credential::{Credential, Operation, Signer, require_delegated};
use kestrel_network::{
  ATTRIBUTE_TIMESTAMP, Attribute, NetworkError, ObjectHeader, ObjectNetwork, PayloadWriter,
  PutOptions,
};
use kestrel_types::{ContainerId, ObjectId, OwnerId};
use tracing::{debug, info};

use crate::error::PipelineError;

/// Everything needed to open a writer for a new object.
pub struct WriteRequest<'a> {
  pub container: ContainerId,
  pub owner: OwnerId,
  pub attributes: Vec<Attribute>,
  pub credential: &'a Credential,
  pub signer: &'a Signer,
}

/// A new object whose payload is still being written.
///
/// The header is provisional until [`PendingObject::finish`] returns the
/// identifier the network assigned.
pub struct PendingObject {
  header: ObjectHeader,
  writer: Box<dyn PayloadWriter>,
  written: u64,
}

impl PendingObject {
  /// Header the object was opened with, including the synthesized timestamp.
  pub fn header(&self) -> &ObjectHeader {
    &self.header
  }

  /// Payload bytes accepted so far.
  pub fn written(&self) -> u64 {
    self.written
  }

  pub async fn write(&mut self, buf: &[u8]) -> Result<usize, NetworkError> {
    let n = self.writer.write(buf).await?;
    self.written += n as u64;
    Ok(n)
  }

  /// Finalize the object. Consumes the writer so it can only happen once.
  ///
  /// Returns the header as the network stored it, checksums included.
  pub async fn finish(self) -> Result<(ObjectHeader, ObjectId), NetworkError> {
    let header = self.writer.finish().await?;
    let id = header
      .id
      .ok_or_else(|| NetworkError::transport("network returned no identifier for the new object"))?;
    Ok((header, id))
  }
}

/// Open a payload writer for a new object.
///
/// Queries the network for its payload limit and epoch, assembles the put
/// options and an object header carrying the caller's attributes plus a
/// creation timestamp, then opens the writer. Only a delegated bearer token
/// can authorize the write.
pub async fn init_writer(
  network: &dyn ObjectNetwork,
  request: WriteRequest<'_>,
) -> Result<PendingObject, PipelineError> {
  let bearer = require_delegated(request.credential, Operation::Put)?;

  let info = network
    .network_info()
    .await
    .map_err(|e| PipelineError::network("network info", e))?;

  let options = PutOptions {
    payload_limit: info.max_object_size,
    current_epoch: info.current_epoch,
    bearer: bearer.clone(),
    homomorphic_checksum: !info.homomorphic_hashing_disabled,
  };

  let mut header = ObjectHeader::new(request.container, request.owner, info.current_epoch);
  header.attributes = request.attributes;
  header.attributes.push(Attribute::new(
    ATTRIBUTE_TIMESTAMP,
    chrono::Utc::now().timestamp().to_string(),
  ));
  debug!(
    container = %header.container,
    attributes = header.attributes.len(),
    "configured header for new object"
  );

  let writer = network
    .put_init(header.clone(), request.signer, options)
    .await
    .map_err(|e| PipelineError::network("open payload writer", e))?;

  info!(
    container = %header.container,
    epoch = info.current_epoch,
    payload_limit = info.max_object_size,
    "payload writer ready"
  );

  Ok(PendingObject {
    header,
    writer,
    written: 0,
  })
}
