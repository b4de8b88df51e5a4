use kestrel_emitter::EmitError;
use kestrel_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  /// Nothing will ever receive the record: the dispatcher was ended or its
  /// drain task stopped.
  #[error("notification listener is not running")]
  NoListener,

  #[error("no database configured")]
  NoDatabase,

  #[error("notification listener already started")]
  AlreadyListening,

  #[error("emit error: {0}")]
  Emit(EmitError),

  #[error("store error: {0}")]
  Store(#[from] StoreError),

  #[error("malformed archived notification: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("drain task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl From<EmitError> for DispatchError {
  fn from(e: EmitError) -> Self {
    match e {
      EmitError::NoDatabase => DispatchError::NoDatabase,
      other => DispatchError::Emit(other),
    }
  }
}
