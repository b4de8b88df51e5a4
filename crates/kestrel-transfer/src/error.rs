//! Transfer errors.

use kestrel_credential::CredentialError;
use kestrel_network::NetworkError;

/// Errors from reading or writing a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
  /// The source is exhausted. Ends a transfer normally.
  #[error("end of stream")]
  EndOfStream,

  /// The sink accepted no bytes.
  #[error("write accepted zero bytes")]
  WriteZero,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Network(#[from] NetworkError),
}

/// Errors from preparing a remote payload writer.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
  #[error(transparent)]
  Credential(#[from] CredentialError),

  /// A network call in the setup sequence failed.
  #[error("{stage}: {source}")]
  Network {
    stage: &'static str,
    #[source]
    source: NetworkError,
  },
}

impl PipelineError {
  pub(crate) fn network(stage: &'static str, source: NetworkError) -> Self {
    Self::Network { stage, source }
  }
}
