//! Kestrel Transfer
//!
//! Moves object payloads between local byte streams and the object network.
//!
//! - [`DuplexStream`] is the read/write/close interface the object executor
//!   pumps. [`DualStream`] builds one from a [`ByteSource`] and a [`ByteSink`].
//! - [`pump`] copies a stream's read half into its write half in
//!   [`CHUNK_SIZE`] chunks until end of stream.
//! - [`ProgressStream`] reports transfer progress to an emitter.
//! - [`init_writer`] performs the network setup for a new object and returns a
//!   [`PendingObject`] whose payload writer slices large payloads on its own.

mod error;
mod progress;
mod pump;
mod stream;
mod writer;

pub use error::{PipelineError, StreamError};
pub use progress::ProgressStream;
pub use pump::{CHUNK_SIZE, pump};
pub use stream::{
  ByteSink, ByteSource, DualStream, DuplexStream, IoSink, IoSource, MemorySink, MemorySource,
  RemoteSource, UploadStream,
};
pub use writer::{PendingObject, WriteRequest, init_writer};
