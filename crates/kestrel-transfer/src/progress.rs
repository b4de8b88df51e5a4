//! Progress reporting for duplex streams.

use std::sync::Arc;

use async_trait::async_trait;
use kestrel_emitter::{Emitter, Payload, ProgressMessage, Topic};
use tracing::warn;

use crate::error::StreamError;
use crate::stream::DuplexStream;

/// Wraps a stream and emits `progress_message` events as bytes are read from
/// it. Uploads only read the local stream and downloads read then write every
/// chunk, so reads measure both directions.
///
/// With a known total an event is emitted whenever the whole percentage
/// changes; otherwise a single completion event is emitted on close. Emission
/// failures are logged and never fail the transfer.
pub struct ProgressStream<S> {
  inner: S,
  emitter: Arc<dyn Emitter>,
  title: String,
  total: Option<u64>,
  transferred: u64,
  last_reported: Option<u8>,
}

impl<S> ProgressStream<S> {
  pub fn new(inner: S, emitter: Arc<dyn Emitter>, title: impl Into<String>, total: Option<u64>) -> Self {
    Self {
      inner,
      emitter,
      title: title.into(),
      total,
      transferred: 0,
      last_reported: None,
    }
  }

  pub fn transferred(&self) -> u64 {
    self.transferred
  }

  pub fn into_inner(self) -> S {
    self.inner
  }

  fn percent(&self) -> Option<u8> {
    let total = self.total?;
    if total == 0 {
      return Some(100);
    }
    Some((self.transferred.saturating_mul(100) / total).min(100) as u8)
  }

  async fn report(&mut self, progress: u8) {
    if self.last_reported == Some(progress) {
      return;
    }
    self.last_reported = Some(progress);
    let message = ProgressMessage {
      title: self.title.clone(),
      progress,
      transferred: self.transferred,
      total: self.total,
    };
    if let Err(e) = self
      .emitter
      .emit(Topic::ProgressMessage, &Payload::Progress(message))
      .await
    {
      warn!(title = %self.title, error = %e, "could not emit progress");
    }
  }
}

#[async_trait]
impl<S: DuplexStream> DuplexStream for ProgressStream<S> {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    let n = self.inner.read(buf).await?;
    if n > 0 {
      self.transferred += n as u64;
      if let Some(progress) = self.percent() {
        self.report(progress).await;
      }
    }
    Ok(n)
  }

  async fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
    self.inner.write(buf).await
  }

  async fn close(&mut self) -> Result<(), StreamError> {
    self.inner.close().await?;
    if self.total.is_none() {
      self.report(100).await;
    }
    Ok(())
  }
}
