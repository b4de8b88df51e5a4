//! The chunked transfer loop.

use tracing::trace;

use crate::error::StreamError;
use crate::stream::DuplexStream;

/// Bytes moved per read.
pub const CHUNK_SIZE: usize = 1024;

/// Copy everything readable from `stream` back into its write half.
///
/// Reads up to [`CHUNK_SIZE`] bytes at a time. Zero-length reads are skipped
/// after yielding to the scheduler, so a caller racing the pump can still
/// cancel it. [`StreamError::EndOfStream`] ends the transfer and every other
/// error aborts it. Returns the number of bytes moved.
pub async fn pump(stream: &mut dyn DuplexStream) -> Result<u64, StreamError> {
  let mut buf = [0u8; CHUNK_SIZE];
  let mut total: u64 = 0;

  loop {
    let n = match stream.read(&mut buf).await {
      Ok(0) => {
        tokio::task::yield_now().await;
        continue;
      }
      Ok(n) => n,
      Err(StreamError::EndOfStream) => {
        trace!(bytes = total, "reached end of stream");
        return Ok(total);
      }
      Err(e) => return Err(e),
    };

    let mut written = 0;
    while written < n {
      match stream.write(&buf[written..n]).await? {
        0 => return Err(StreamError::WriteZero),
        w => written += w,
      }
    }
    total += n as u64;
  }
}
