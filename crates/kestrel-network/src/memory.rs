//! In-process object network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use kestrel_credential::{BearerToken, GateAccount, Operation, Signer};
use kestrel_types::{ContainerId, ObjectId};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::NetworkError;
use crate::header::{Checksum, ObjectHeader, ObjectType};
use crate::network::{
  NetworkInfo, ObjectIdStream, ObjectNetwork, PayloadReader, PayloadWriter, PutOptions,
  SearchFilters,
};

/// Configuration for [`MemoryNetwork`].
#[derive(Debug, Clone)]
pub struct MemoryNetworkConfig {
  pub max_object_size: u64,
  pub current_epoch: u64,
  pub homomorphic_hashing_disabled: bool,
}

impl Default for MemoryNetworkConfig {
  fn default() -> Self {
    Self {
      max_object_size: 64 * 1024 * 1024,
      current_epoch: 1,
      homomorphic_hashing_disabled: false,
    }
  }
}

#[derive(Debug, Clone)]
struct StoredObject {
  header: ObjectHeader,
  payload: Bytes,
  /// Parts of a sliced object, in payload order.
  children: Vec<ObjectId>,
  seq: u64,
}

#[derive(Debug, Default)]
struct State {
  /// Container owner public keys.
  containers: HashMap<ContainerId, [u8; 32]>,
  objects: HashMap<(ContainerId, ObjectId), StoredObject>,
  nonce: u64,
}

impl State {
  fn next_id(&mut self, seed: &[u8]) -> [u8; 32] {
    self.nonce += 1;
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(self.nonce.to_le_bytes());
    hasher.finalize().into()
  }

  /// Store an object under a fresh identifier, returning its stored header.
  fn store(&mut self, mut header: ObjectHeader, payload: Bytes, children: Vec<ObjectId>) -> ObjectHeader {
    let id = ObjectId::from_bytes(self.next_id(&payload));
    header.id = Some(id);
    let seq = self.nonce;
    self.objects.insert(
      (header.container, id),
      StoredObject {
        header: header.clone(),
        payload,
        children,
        seq,
      },
    );
    header
  }

  fn authorize(
    &self,
    container: ContainerId,
    signer: &Signer,
    bearer: &BearerToken,
    operation: Operation,
    epoch: u64,
  ) -> Result<(), NetworkError> {
    let owner_key = self
      .containers
      .get(&container)
      .ok_or_else(|| NetworkError::not_found(format!("container {}", container)))?;

    if signer.public_key() == *owner_key {
      return Ok(());
    }
    if !bearer.verify_signature() {
      return Err(NetworkError::access_denied("bearer token signature is invalid"));
    }
    if bearer.issuer != *owner_key {
      return Err(NetworkError::access_denied(
        "bearer token is not issued by the container owner",
      ));
    }
    if bearer.container != container {
      return Err(NetworkError::access_denied(
        "bearer token is issued for another container",
      ));
    }
    if !bearer.allows(operation) {
      return Err(NetworkError::access_denied(format!(
        "operation {:?} is not allowed by the bearer token",
        operation
      )));
    }
    if bearer.is_expired(epoch) {
      return Err(NetworkError::access_denied("bearer token expired"));
    }
    Ok(())
  }

  fn get(&self, container: ContainerId, object: ObjectId) -> Result<&StoredObject, NetworkError> {
    self
      .objects
      .get(&(container, object))
      .ok_or_else(|| NetworkError::not_found(format!("object {}/{}", container, object)))
  }

  fn full_payload(&self, container: ContainerId, stored: &StoredObject) -> Result<Bytes, NetworkError> {
    if stored.children.is_empty() {
      return Ok(stored.payload.clone());
    }
    let mut payload = Vec::with_capacity(stored.header.payload_size as usize);
    for child in &stored.children {
      payload.extend_from_slice(&self.get(container, *child)?.payload);
    }
    Ok(Bytes::from(payload))
  }
}

/// An object network held entirely in memory.
///
/// Containers are owned by the account that created them. Requests signed by
/// the owner are always allowed; any other signer needs a valid bearer token
/// issued by the owner for the container and operation.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
  state: Arc<Mutex<State>>,
  epoch: Arc<AtomicU64>,
  config: MemoryNetworkConfig,
}

impl Default for MemoryNetwork {
  fn default() -> Self {
    Self::new(MemoryNetworkConfig::default())
  }
}

impl MemoryNetwork {
  pub fn new(config: MemoryNetworkConfig) -> Self {
    Self {
      state: Arc::new(Mutex::new(State::default())),
      epoch: Arc::new(AtomicU64::new(config.current_epoch)),
      config,
    }
  }

  /// Create an empty container owned by `owner`.
  pub async fn create_container(&self, owner: &GateAccount) -> ContainerId {
    let mut state = self.state.lock().await;
    let id = ContainerId::from_bytes(state.next_id(&owner.public_key()));
    state.containers.insert(id, owner.public_key());
    id
  }

  pub fn current_epoch(&self) -> u64 {
    self.epoch.load(Ordering::SeqCst)
  }

  /// Move to the next epoch, returning it.
  pub fn advance_epoch(&self) -> u64 {
    self.epoch.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Number of stored network objects in a container, parts included.
  pub async fn stored_objects(&self, container: ContainerId) -> usize {
    let state = self.state.lock().await;
    state.objects.keys().filter(|(c, _)| *c == container).count()
  }
}

#[async_trait]
impl ObjectNetwork for MemoryNetwork {
  async fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
    Ok(NetworkInfo {
      max_object_size: self.config.max_object_size,
      current_epoch: self.current_epoch(),
      homomorphic_hashing_disabled: self.config.homomorphic_hashing_disabled,
    })
  }

  async fn head(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<ObjectHeader, NetworkError> {
    let state = self.state.lock().await;
    state.authorize(container, signer, bearer, Operation::Head, self.current_epoch())?;
    Ok(state.get(container, object)?.header.clone())
  }

  async fn get_init(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(ObjectHeader, Box<dyn PayloadReader>), NetworkError> {
    let state = self.state.lock().await;
    state.authorize(container, signer, bearer, Operation::Get, self.current_epoch())?;
    let stored = state.get(container, object)?;
    let payload = state.full_payload(container, stored)?;
    let reader = MemoryReader { payload, offset: 0 };
    Ok((stored.header.clone(), Box::new(reader)))
  }

  async fn put_init(
    &self,
    header: ObjectHeader,
    signer: &Signer,
    options: PutOptions,
  ) -> Result<Box<dyn PayloadWriter>, NetworkError> {
    {
      let state = self.state.lock().await;
      state.authorize(
        header.container,
        signer,
        &options.bearer,
        Operation::Put,
        self.current_epoch(),
      )?;
    }
    debug!(
      container = %header.container,
      payload_limit = options.payload_limit,
      "opened payload writer"
    );
    Ok(Box::new(MemoryWriter {
      state: self.state.clone(),
      header,
      options,
      buffer: Vec::new(),
      hasher: Sha256::new(),
      size: 0,
      parts: Vec::new(),
    }))
  }

  async fn delete(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(), NetworkError> {
    let mut state = self.state.lock().await;
    state.authorize(container, signer, bearer, Operation::Delete, self.current_epoch())?;
    let stored = state
      .objects
      .remove(&(container, object))
      .ok_or_else(|| NetworkError::not_found(format!("object {}/{}", container, object)))?;
    for child in stored.children {
      state.objects.remove(&(container, child));
    }
    Ok(())
  }

  async fn search(
    &self,
    container: ContainerId,
    signer: &Signer,
    bearer: &BearerToken,
    filters: SearchFilters,
  ) -> Result<ObjectIdStream, NetworkError> {
    let state = self.state.lock().await;
    state.authorize(container, signer, bearer, Operation::Search, self.current_epoch())?;

    let mut matched: Vec<(u64, ObjectId)> = state
      .objects
      .iter()
      .filter(|((c, _), stored)| *c == container && filters.matches(&stored.header))
      .map(|((_, id), stored)| (stored.seq, *id))
      .collect();
    matched.sort();

    let ids = matched.into_iter().map(|(_, id)| Ok(id)).collect::<Vec<_>>();
    Ok(futures::stream::iter(ids).boxed())
  }
}

struct MemoryReader {
  payload: Bytes,
  offset: usize,
}

#[async_trait]
impl PayloadReader for MemoryReader {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, NetworkError> {
    let remaining = &self.payload[self.offset..];
    let n = remaining.len().min(buf.len());
    buf[..n].copy_from_slice(&remaining[..n]);
    self.offset += n;
    Ok(n)
  }
}

/// Slices the payload into parts of at most `payload_limit` bytes.
struct MemoryWriter {
  state: Arc<Mutex<State>>,
  header: ObjectHeader,
  options: PutOptions,
  buffer: Vec<u8>,
  hasher: Sha256,
  size: u64,
  parts: Vec<(ObjectId, Checksum)>,
}

impl MemoryWriter {
  fn payload_header(&self, payload: &[u8]) -> ObjectHeader {
    let mut header = self.header.clone();
    header.payload_size = payload.len() as u64;
    header.payload_checksum = Some(Checksum(Sha256::digest(payload).into()));
    header
  }

  async fn cut_part(&mut self, len: usize) {
    let payload: Vec<u8> = self.buffer.drain(..len).collect();
    let mut header = self.payload_header(&payload);
    header.object_type = ObjectType::Part;
    let checksum = header.payload_checksum.unwrap_or(Checksum([0; 32]));
    let stored = self
      .state
      .lock()
      .await
      .store(header, Bytes::from(payload), Vec::new());
    if let Some(id) = stored.id {
      self.parts.push((id, checksum));
    }
  }

  fn homomorphic(&self, checksums: &[Checksum]) -> Option<Checksum> {
    if !self.options.homomorphic_checksum {
      return None;
    }
    let mut hasher = Sha256::new();
    for checksum in checksums {
      hasher.update(checksum.0);
    }
    Some(Checksum(hasher.finalize().into()))
  }
}

#[async_trait]
impl PayloadWriter for MemoryWriter {
  async fn write(&mut self, buf: &[u8]) -> Result<usize, NetworkError> {
    self.buffer.extend_from_slice(buf);
    self.hasher.update(buf);
    self.size += buf.len() as u64;

    let limit = self.options.payload_limit as usize;
    while limit > 0 && self.buffer.len() > limit {
      self.cut_part(limit).await;
    }
    Ok(buf.len())
  }

  async fn finish(mut self: Box<Self>) -> Result<ObjectHeader, NetworkError> {
    if self.parts.is_empty() {
      let payload = std::mem::take(&mut self.buffer);
      let mut header = self.payload_header(&payload);
      let checksums: Vec<Checksum> = header.payload_checksum.into_iter().collect();
      header.homomorphic_checksum = self.homomorphic(&checksums);
      let stored = self
        .state
        .lock()
        .await
        .store(header, Bytes::from(payload), Vec::new());
      debug!(object = ?stored.id, "stored object");
      return Ok(stored);
    }

    if !self.buffer.is_empty() {
      let len = self.buffer.len();
      self.cut_part(len).await;
    }

    let checksums: Vec<Checksum> = self.parts.iter().map(|(_, c)| *c).collect();
    let mut header = self.header.clone();
    header.object_type = ObjectType::Link;
    header.payload_size = self.size;
    header.payload_checksum = Some(Checksum(self.hasher.clone().finalize().into()));
    header.homomorphic_checksum = self.homomorphic(&checksums);

    let children: Vec<ObjectId> = self.parts.iter().map(|(id, _)| *id).collect();
    let container = header.container;
    let mut state = self.state.lock().await;
    let stored = state.store(header, Bytes::new(), children.clone());
    for child in children {
      if let Some(part) = state.objects.get_mut(&(container, child)) {
        part.header.parent = stored.id;
      }
    }
    debug!(object = ?stored.id, parts = self.parts.len(), "stored sliced object");
    Ok(stored)
  }
}
