use std::fmt;
use std::sync::Arc;

use kestrel_credential::{Credential, GateAccount, Operation};
use kestrel_emitter::Emitter;
use kestrel_network::Attribute;
use kestrel_transfer::DuplexStream;
use kestrel_types::OwnerId;
use tokio_util::sync::CancellationToken;

/// The request context of one object operation.
///
/// Identifiers are kept as the caller supplied them and decoded by the
/// operation itself. The object identifier may be empty for `create` and
/// `list`.
pub struct ObjectParameters {
  pub container_id: String,
  pub object_id: String,
  pub credential: Credential,
  /// Account whose key signs the network requests.
  pub gate_account: Option<GateAccount>,
  /// Owner recorded on new objects. Defaults to the gate account's owner.
  pub owner: Option<OwnerId>,
  /// Local side of a `create` or `read` transfer.
  pub stream: Option<Box<dyn DuplexStream>>,
  pub emitter: Arc<dyn Emitter>,
  /// Attributes attached to a new object.
  pub attributes: Vec<Attribute>,
  /// Operation the caller requested, for access checks upstream.
  pub operation: Operation,
  /// Cancels in-flight network calls.
  pub cancel: CancellationToken,
}

impl ObjectParameters {
  pub fn new(
    operation: Operation,
    container_id: impl Into<String>,
    object_id: impl Into<String>,
    credential: Credential,
    emitter: Arc<dyn Emitter>,
  ) -> Self {
    Self {
      container_id: container_id.into(),
      object_id: object_id.into(),
      credential,
      gate_account: None,
      owner: None,
      stream: None,
      emitter,
      attributes: Vec::new(),
      operation,
      cancel: CancellationToken::new(),
    }
  }

  pub fn with_gate_account(mut self, account: GateAccount) -> Self {
    self.gate_account = Some(account);
    self
  }

  pub fn with_owner(mut self, owner: OwnerId) -> Self {
    self.owner = Some(owner);
    self
  }

  pub fn with_stream(mut self, stream: impl DuplexStream + 'static) -> Self {
    self.stream = Some(Box::new(stream));
    self
  }

  pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.push(Attribute::new(key, value));
    self
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Give the stream back once the transfer is done.
  pub fn take_stream(&mut self) -> Option<Box<dyn DuplexStream>> {
    self.stream.take()
  }

  pub(crate) fn gate_account(&self) -> Result<&GateAccount, crate::ObjectError> {
    self
      .gate_account
      .as_ref()
      .ok_or(crate::ObjectError::NoGateAccount)
  }
}

impl fmt::Debug for ObjectParameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ObjectParameters")
      .field("container_id", &self.container_id)
      .field("object_id", &self.object_id)
      .field("credential", &self.credential.kind())
      .field("gate_account", &self.gate_account)
      .field("owner", &self.owner)
      .field("stream", &self.stream.is_some())
      .field("attributes", &self.attributes)
      .field("operation", &self.operation)
      .finish_non_exhaustive()
  }
}
