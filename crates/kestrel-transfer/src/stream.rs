//! Byte stream traits and adapters.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use kestrel_network::PayloadReader;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::StreamError;
use crate::writer::PendingObject;

/// Produces bytes.
///
/// `read` returns [`StreamError::EndOfStream`] once exhausted. A read of zero
/// bytes is not the end of the stream.
#[async_trait]
pub trait ByteSource: Send {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;
}

/// Consumes bytes.
#[async_trait]
pub trait ByteSink: Send {
  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

  async fn close(&mut self) -> Result<(), StreamError>;
}

/// A stream read from one side and written to the other.
///
/// The object executor pumps a duplex stream to bridge a local file or buffer
/// with a remote payload.
#[async_trait]
pub trait DuplexStream: Send {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

  async fn close(&mut self) -> Result<(), StreamError>;
}

/// A duplex stream built from a separate source and sink.
pub struct DualStream {
  source: Box<dyn ByteSource>,
  sink: Box<dyn ByteSink>,
}

impl DualStream {
  pub fn new(source: impl ByteSource + 'static, sink: impl ByteSink + 'static) -> Self {
    Self::from_boxed(Box::new(source), Box::new(sink))
  }

  pub fn from_boxed(source: Box<dyn ByteSource>, sink: Box<dyn ByteSink>) -> Self {
    Self { source, sink }
  }

  pub fn into_parts(self) -> (Box<dyn ByteSource>, Box<dyn ByteSink>) {
    (self.source, self.sink)
  }
}

#[async_trait]
impl DuplexStream for DualStream {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    self.source.read(buf).await
  }

  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
    self.sink.write(buf).await
  }

  async fn close(&mut self) -> Result<(), StreamError> {
    self.sink.close().await
  }
}

/// Reads from a local stream and writes into a pending remote object.
///
/// Closing closes the local stream only; the remote object is finalized by
/// [`PendingObject::finish`].
pub struct UploadStream<'a> {
  local: &'a mut dyn DuplexStream,
  remote: &'a mut PendingObject,
}

impl<'a> UploadStream<'a> {
  pub fn new(local: &'a mut dyn DuplexStream, remote: &'a mut PendingObject) -> Self {
    Self { local, remote }
  }
}

#[async_trait]
impl DuplexStream for UploadStream<'_> {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    self.local.read(buf).await
  }

  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
    Ok(self.remote.write(buf).await?)
  }

  async fn close(&mut self) -> Result<(), StreamError> {
    self.local.close().await
  }
}

/// Source over any tokio reader.
pub struct IoSource<R> {
  reader: R,
}

impl<R> IoSource<R> {
  pub fn new(reader: R) -> Self {
    Self { reader }
  }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for IoSource<R> {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    if buf.is_empty() {
      return Ok(0);
    }
    match self.reader.read(buf).await? {
      0 => Err(StreamError::EndOfStream),
      n => Ok(n),
    }
  }
}

/// Sink over any tokio writer.
pub struct IoSink<W> {
  writer: W,
}

impl<W> IoSink<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ByteSink for IoSink<W> {
  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
    self.writer.write_all(buf).await?;
    Ok(buf.len())
  }

  async fn close(&mut self) -> Result<(), StreamError> {
    self.writer.flush().await?;
    self.writer.shutdown().await?;
    Ok(())
  }
}

/// Source over a remote payload reader.
pub struct RemoteSource {
  reader: Box<dyn PayloadReader>,
}

impl RemoteSource {
  pub fn new(reader: Box<dyn PayloadReader>) -> Self {
    Self { reader }
  }
}

#[async_trait]
impl ByteSource for RemoteSource {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    if buf.is_empty() {
      return Ok(0);
    }
    match self.reader.read(buf).await? {
      0 => Err(StreamError::EndOfStream),
      n => Ok(n),
    }
  }
}

/// Source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
  data: Bytes,
  offset: usize,
}

impl MemorySource {
  pub fn new(data: impl Into<Bytes>) -> Self {
    Self {
      data: data.into(),
      offset: 0,
    }
  }
}

#[async_trait]
impl ByteSource for MemorySource {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    if self.offset >= self.data.len() {
      return Err(StreamError::EndOfStream);
    }
    let n = (self.data.len() - self.offset).min(buf.len());
    buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
    self.offset += n;
    Ok(n)
  }
}

/// Sink collecting bytes in memory.
///
/// Clones share the same buffer, so a caller can keep a handle to inspect what
/// was written after the sink has been moved into a stream.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
  buffer: Arc<Mutex<Vec<u8>>>,
  closed: Arc<Mutex<bool>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contents(&self) -> Vec<u8> {
    self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn is_closed(&self) -> bool {
    *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[async_trait]
impl ByteSink for MemorySink {
  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
    self
      .buffer
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .extend_from_slice(buf);
    Ok(buf.len())
  }

  async fn close(&mut self) -> Result<(), StreamError> {
    *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    Ok(())
  }
}
