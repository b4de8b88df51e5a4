//! End-to-end tests for the object executor against an in-memory network.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kestrel_credential::{BearerToken, Credential, GateAccount, Operation, SessionToken, Signer};
use kestrel_emitter::{ChannelEmitter, Event, Payload, Topic};
use kestrel_network::{
  ATTRIBUTE_CONTENT_TYPE, ATTRIBUTE_FILE_NAME, ATTRIBUTE_TIMESTAMP, MemoryNetwork,
  MemoryNetworkConfig, NetworkError, NetworkInfo, ObjectHeader, ObjectIdStream, ObjectNetwork,
  PayloadReader, PayloadWriter, PutOptions, SearchFilters,
};
use kestrel_notification::{DispatchConfig, Dispatcher};
use kestrel_object::{ExecutorConfig, ObjectError, ObjectExecutor, ObjectParameters};
use kestrel_transfer::{
  ByteSource, DualStream, MemorySink, MemorySource, ProgressStream, StreamError,
};
use kestrel_types::{ContainerId, NotificationRecord, ObjectDescriptor, ObjectId, Severity};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

const ALL_OPERATIONS: [Operation; 5] = [
  Operation::Get,
  Operation::Head,
  Operation::Put,
  Operation::Delete,
  Operation::Search,
];

/// Knobs for making a network call misbehave.
#[derive(Default)]
struct Faults {
  /// 1-based index of the head call that fails.
  fail_head_call: Option<usize>,
  delete_delay: Option<Duration>,
}

/// Counts network calls and injects faults.
struct TestNetwork {
  inner: MemoryNetwork,
  calls: AtomicUsize,
  heads: AtomicUsize,
  faults: Faults,
}

impl TestNetwork {
  fn new(inner: MemoryNetwork, faults: Faults) -> Self {
    Self {
      inner,
      calls: AtomicUsize::new(0),
      heads: AtomicUsize::new(0),
      faults,
    }
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn record(&self) {
    self.calls.fetch_add(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl ObjectNetwork for TestNetwork {
  async fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
    self.record();
    self.inner.network_info().await
  }

  async fn head(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<ObjectHeader, NetworkError> {
    self.record();
    let n = self.heads.fetch_add(1, Ordering::SeqCst) + 1;
    if self.faults.fail_head_call == Some(n) {
      return Err(NetworkError::transport("connection reset"));
    }
    self.inner.head(container, object, signer, bearer).await
  }

  async fn get_init(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(ObjectHeader, Box<dyn PayloadReader>), NetworkError> {
    self.record();
    self.inner.get_init(container, object, signer, bearer).await
  }

  async fn put_init(
    &self,
    header: ObjectHeader,
    signer: &Signer,
    options: PutOptions,
  ) -> Result<Box<dyn PayloadWriter>, NetworkError> {
    self.record();
    self.inner.put_init(header, signer, options).await
  }

  async fn delete(
    &self,
    container: ContainerId,
    object: ObjectId,
    signer: &Signer,
    bearer: &BearerToken,
  ) -> Result<(), NetworkError> {
    self.record();
    if let Some(delay) = self.faults.delete_delay {
      tokio::time::sleep(delay).await;
    }
    self.inner.delete(container, object, signer, bearer).await
  }

  async fn search(
    &self,
    container: ContainerId,
    signer: &Signer,
    bearer: &BearerToken,
    filters: SearchFilters,
  ) -> Result<ObjectIdStream, NetworkError> {
    self.record();
    self.inner.search(container, signer, bearer, filters).await
  }
}

struct Fixture {
  memory: MemoryNetwork,
  network: Arc<TestNetwork>,
  owner: GateAccount,
  gate: GateAccount,
  container: ContainerId,
  dispatcher: Arc<Dispatcher>,
  notifications: UnboundedReceiver<Event>,
  executor: ObjectExecutor,
}

impl Fixture {
  async fn new() -> Self {
    Self::build(MemoryNetworkConfig::default(), Faults::default(), ExecutorConfig::default()).await
  }

  async fn build(config: MemoryNetworkConfig, faults: Faults, executor_config: ExecutorConfig) -> Self {
    let memory = MemoryNetwork::new(config);
    let owner = GateAccount::generate();
    let gate = GateAccount::generate();
    let container = memory.create_container(&owner).await;

    let network = Arc::new(TestNetwork::new(memory.clone(), faults));
    let (emitter, notifications) = ChannelEmitter::channel();
    let dispatcher = Arc::new(Dispatcher::new(
      Arc::new(emitter),
      DispatchConfig::for_recipient("tester"),
    ));
    dispatcher.listen_and_emit().unwrap();

    let executor = ObjectExecutor::with_config(network.clone(), dispatcher.clone(), executor_config);

    Self {
      memory,
      network,
      owner,
      gate,
      container,
      dispatcher,
      notifications,
      executor,
    }
  }

  fn bearer(&self) -> BearerToken {
    BearerToken::issue(
      self.owner.signing_key(),
      self.container,
      100,
      ALL_OPERATIONS.to_vec(),
    )
  }

  fn delegated(&self) -> Credential {
    Credential::Delegated(self.bearer())
  }

  fn session(&self) -> Credential {
    Credential::Session(SessionToken {
      bearer: self.bearer(),
      session_expiry_epoch: 100,
    })
  }

  fn params(
    &self,
    operation: Operation,
    object: &str,
    credential: Credential,
  ) -> (ObjectParameters, UnboundedReceiver<Event>) {
    let (emitter, events) = ChannelEmitter::channel();
    let params = ObjectParameters::new(
      operation,
      self.container.to_string(),
      object,
      credential,
      Arc::new(emitter),
    )
    .with_gate_account(self.gate.clone());
    (params, events)
  }

  async fn upload(&mut self, data: &[u8]) -> ObjectId {
    let (params, _) = self.params(Operation::Put, "", self.delegated());
    let mut params = params
      .with_stream(DualStream::new(MemorySource::new(data.to_vec()), MemorySink::new()))
      .with_attribute(ATTRIBUTE_FILE_NAME, "upload.bin");
    let id = self.executor.create(&mut params).await.unwrap();
    assert_eq!(self.next_notification().await.severity, Severity::Success);
    id
  }

  async fn download(&mut self, id: ObjectId) -> Vec<u8> {
    let (params, _) = self.params(Operation::Get, &id.to_string(), self.delegated());
    let (_, source) = self.executor.init_reader(&params).await.unwrap();
    let sink = MemorySink::new();
    let mut params = params.with_stream(DualStream::new(source, sink.clone()));

    self.executor.read(&mut params).await.unwrap();
    assert_eq!(self.next_notification().await.severity, Severity::Success);
    assert!(sink.is_closed());
    sink.contents()
  }

  async fn next_notification(&mut self) -> NotificationRecord {
    let event = tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
      .await
      .expect("no notification delivered")
      .expect("notification channel closed");
    assert_eq!(event.topic, Topic::NotificationMessage);
    match event.payload {
      Payload::Notification(record) => record,
      other => panic!("unexpected payload: {:?}", other),
    }
  }

  /// No further notification arrives.
  async fn assert_quiet(&mut self) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(self.notifications.try_recv().is_err());
  }
}

fn drain(events: &mut UnboundedReceiver<Event>) -> Vec<(Topic, ObjectDescriptor)> {
  let mut out = Vec::new();
  while let Ok(event) = events.try_recv() {
    match event.payload {
      Payload::Object(descriptor) => out.push((event.topic, descriptor)),
      other => panic!("unexpected payload: {:?}", other),
    }
  }
  out
}

fn payload(len: usize) -> Vec<u8> {
  (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_create_then_read_round_trip() {
  let mut f = Fixture::new().await;
  let data = payload(5000);

  let (params, mut events) = f.params(Operation::Put, "", f.delegated());
  let mut params = params
    .with_stream(DualStream::new(MemorySource::new(data.clone()), MemorySink::new()))
    .with_attribute(ATTRIBUTE_FILE_NAME, "report.pdf")
    .with_attribute(ATTRIBUTE_CONTENT_TYPE, "application/pdf");

  let id = f.executor.create(&mut params).await.unwrap();

  let emitted = drain(&mut events);
  assert_eq!(emitted.len(), 1);
  let (topic, descriptor) = &emitted[0];
  assert_eq!(*topic, Topic::ObjectAddUpdate);
  assert_eq!(descriptor.id, id.to_string());
  assert_eq!(descriptor.parent_id, f.container.to_string());
  assert_eq!(descriptor.name, "report.pdf");
  assert_eq!(descriptor.content_type, "application/pdf");
  assert_eq!(descriptor.size, 5000);
  assert!(descriptor.created_at > 0);

  let record = f.next_notification().await;
  assert_eq!(record.severity, Severity::Success);
  assert_eq!(record.user, "tester");
  assert_eq!(record.meta.get("object"), Some(&id.to_string()));
  f.assert_quiet().await;

  assert_eq!(f.download(id).await, data);
}

#[tokio::test]
async fn test_large_payload_is_sliced_transparently() {
  let mut f = Fixture::build(
    MemoryNetworkConfig {
      max_object_size: 1000,
      ..Default::default()
    },
    Faults::default(),
    ExecutorConfig::default(),
  )
  .await;
  let data = payload(4097);

  let id = f.upload(&data).await;
  assert!(f.memory.stored_objects(f.container).await > 1);
  assert_eq!(f.download(id).await, data);
}

#[tokio::test]
async fn test_empty_payload_round_trip() {
  let mut f = Fixture::new().await;
  let id = f.upload(&[]).await;
  assert!(f.download(id).await.is_empty());
}

#[tokio::test]
async fn test_invalid_identifiers_fail_before_network() {
  let mut f = Fixture::new().await;
  let valid = ObjectId::from_bytes([7u8; 32]).to_string();

  for (container, object) in [
    ("", valid.as_str()),
    ("not-base58-0OIl", valid.as_str()),
    ("3mJr7AoUXx2Wqd", valid.as_str()),
  ] {
    let (params, mut events) = f.params(Operation::Head, object, f.delegated());
    let mut params = ObjectParameters {
      container_id: container.to_string(),
      ..params
    };

    assert!(matches!(f.executor.head(&params).await, Err(ObjectError::InvalidIdentifier(_))));
    assert!(matches!(f.executor.list(&params).await, Err(ObjectError::InvalidIdentifier(_))));
    assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::InvalidIdentifier(_))));
    assert!(matches!(
      f.executor.init_reader(&params).await,
      Err(ObjectError::InvalidIdentifier(_))
    ));

    params.stream = Some(Box::new(DualStream::new(MemorySource::new(vec![1u8]), MemorySink::new())));
    assert!(matches!(f.executor.read(&mut params).await, Err(ObjectError::InvalidIdentifier(_))));
    assert!(matches!(
      f.executor.create(&mut params).await,
      Err(ObjectError::InvalidIdentifier(_))
    ));
    assert!(drain(&mut events).is_empty());
  }

  let (params, _) = f.params(Operation::Head, "definitely not an id", f.delegated());
  assert!(matches!(f.executor.head(&params).await, Err(ObjectError::InvalidIdentifier(_))));
  assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::InvalidIdentifier(_))));

  assert_eq!(f.network.calls(), 0);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_unrecognized_credential_is_rejected() {
  let mut f = Fixture::new().await;
  let object = ObjectId::from_bytes([7u8; 32]).to_string();
  let credential = Credential::Unrecognized {
    kind: "container_session".to_string(),
  };

  let (params, mut events) = f.params(Operation::Head, &object, credential);
  assert!(matches!(f.executor.head(&params).await, Err(ObjectError::NoToken)));
  assert!(matches!(f.executor.list(&params).await, Err(ObjectError::NoToken)));
  assert!(matches!(f.executor.init_reader(&params).await, Err(ObjectError::NoToken)));
  assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::NoBearerToken)));

  let mut params = params.with_stream(DualStream::new(MemorySource::new(vec![1u8]), MemorySink::new()));
  assert!(matches!(f.executor.create(&mut params).await, Err(ObjectError::NoBearerToken)));

  assert_eq!(f.network.calls(), 0);
  assert!(drain(&mut events).is_empty());
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_session_credential_reads_but_cannot_write() {
  let mut f = Fixture::new().await;
  let id = f.upload(b"session scoped").await;

  let (params, _events) = f.params(Operation::Head, &id.to_string(), f.session());
  let descriptor = f.executor.head(&params).await.unwrap();
  assert_eq!(descriptor.id, id.to_string());

  let calls = f.network.calls();
  assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::NoBearerToken)));
  let mut params = params.with_stream(DualStream::new(MemorySource::new(vec![1u8]), MemorySink::new()));
  assert!(matches!(f.executor.create(&mut params).await, Err(ObjectError::NoBearerToken)));
  assert_eq!(f.network.calls(), calls);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_missing_gate_account() {
  let mut f = Fixture::new().await;
  let id = f.upload(b"data").await;

  let (mut params, _) = f.params(Operation::Head, &id.to_string(), f.delegated());
  params.gate_account = None;

  let calls = f.network.calls();
  assert!(matches!(f.executor.head(&params).await, Err(ObjectError::NoGateAccount)));
  assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::NoGateAccount)));
  assert_eq!(f.network.calls(), calls);
}

#[tokio::test]
async fn test_head_is_idempotent() {
  let mut f = Fixture::new().await;
  let id = f.upload(b"same every time").await;

  let (params, mut events) = f.params(Operation::Head, &id.to_string(), f.delegated());
  let first = f.executor.head(&params).await.unwrap();
  let second = f.executor.head(&params).await.unwrap();

  assert_eq!(first, second);
  assert!(first.is_resolved());
  assert_eq!(first.name, "upload.bin");
  assert!(first.attributes.contains_key(ATTRIBUTE_TIMESTAMP));
  assert_eq!(first.attributes.get("payload_checksum").map(String::len), Some(64));

  let emitted = drain(&mut events);
  assert_eq!(emitted.len(), 2);
  assert!(emitted.iter().all(|(topic, d)| *topic == Topic::ObjectAddUpdate && *d == first));
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_access_denied_keeps_reason() {
  let f = Fixture::new().await;
  let expired = BearerToken::issue(f.owner.signing_key(), f.container, 0, ALL_OPERATIONS.to_vec());
  f.memory.advance_epoch();

  let object = ObjectId::from_bytes([7u8; 32]).to_string();
  let (params, mut events) = f.params(Operation::Head, &object, Credential::Delegated(expired));

  match f.executor.head(&params).await {
    Err(ObjectError::AccessDenied { reason }) => assert_eq!(reason, "bearer token expired"),
    other => panic!("expected access denied, got {:?}", other),
  }
  assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_delete_removes_object() {
  let mut f = Fixture::new().await;
  let id = f.upload(b"short lived").await;

  let (params, mut events) = f.params(Operation::Delete, &id.to_string(), f.delegated());
  f.executor.delete(&params).await.unwrap();

  let emitted = drain(&mut events);
  assert_eq!(
    emitted,
    vec![(
      Topic::ObjectRemoveUpdate,
      ObjectDescriptor::keyed(f.container.to_string(), id.to_string())
    )]
  );

  let record = f.next_notification().await;
  assert_eq!(record.severity, Severity::Success);
  f.assert_quiet().await;

  assert!(matches!(f.executor.head(&params).await, Err(ObjectError::Transfer { .. })));
}

#[tokio::test]
async fn test_delete_missing_object_reports_one_failure() {
  let mut f = Fixture::new().await;
  let missing = ObjectId::from_bytes([9u8; 32]).to_string();

  let (params, mut events) = f.params(Operation::Delete, &missing, f.delegated());
  assert!(matches!(f.executor.delete(&params).await, Err(ObjectError::Transfer { .. })));

  let emitted = drain(&mut events);
  assert_eq!(emitted.len(), 1);
  assert_eq!(emitted[0].0, Topic::ObjectFailed);
  assert_eq!(emitted[0].1.id, missing);

  let record = f.next_notification().await;
  assert_eq!(record.severity, Severity::Error);
  assert_eq!(record.meta.get("object"), Some(&missing));
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_delete_times_out() {
  let mut f = Fixture::build(
    MemoryNetworkConfig::default(),
    Faults {
      delete_delay: Some(Duration::from_secs(5)),
      ..Default::default()
    },
    ExecutorConfig {
      delete_timeout: Duration::from_millis(20),
    },
  )
  .await;
  let id = f.upload(b"slow").await;

  let (params, _) = f.params(Operation::Delete, &id.to_string(), f.delegated());
  match f.executor.delete(&params).await {
    Err(ObjectError::Transfer { message }) => assert!(message.contains("timed out")),
    other => panic!("expected timeout, got {:?}", other),
  }
  assert_eq!(f.next_notification().await.severity, Severity::Error);
}

#[tokio::test]
async fn test_list_heads_every_root_object() {
  let mut f = Fixture::build(
    MemoryNetworkConfig {
      max_object_size: 16,
      ..Default::default()
    },
    Faults::default(),
    ExecutorConfig::default(),
  )
  .await;
  let mut uploaded = vec![
    f.upload(b"one").await.to_string(),
    f.upload(&payload(100)).await.to_string(),
    f.upload(b"three").await.to_string(),
  ];

  let (params, mut events) = f.params(Operation::Search, "", f.delegated());
  let listed = f.executor.list(&params).await.unwrap();
  assert_eq!(listed.len(), 3);

  let emitted = drain(&mut events);
  assert_eq!(emitted.len(), 3);
  assert!(emitted.iter().all(|(topic, d)| {
    *topic == Topic::ObjectAddUpdate && d.parent_id == f.container.to_string()
  }));

  let mut emitted_ids: Vec<String> = emitted.into_iter().map(|(_, d)| d.id).collect();
  emitted_ids.sort();
  uploaded.sort();
  assert_eq!(emitted_ids, uploaded);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_list_stops_at_first_failing_head() {
  let mut f = Fixture::build(
    MemoryNetworkConfig::default(),
    Faults {
      fail_head_call: Some(2),
      ..Default::default()
    },
    ExecutorConfig::default(),
  )
  .await;
  for data in [&b"a"[..], b"b", b"c"] {
    f.upload(data).await;
  }

  let (params, mut events) = f.params(Operation::Search, "", f.delegated());
  assert!(matches!(f.executor.list(&params).await, Err(ObjectError::Transfer { .. })));
  assert_eq!(drain(&mut events).len(), 1);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_forged_token_aborts_create_before_finalizing() {
  let mut f = Fixture::new().await;
  let mut forged = f.bearer();
  forged.expiry_epoch += 1;

  // The container owner passes network authorization regardless of the token.
  let (params, mut events) = f.params(Operation::Put, "", Credential::Delegated(forged));
  let mut params = params
    .with_gate_account(f.owner.clone())
    .with_stream(DualStream::new(MemorySource::new(payload(3000)), MemorySink::new()));

  assert!(matches!(
    f.executor.create(&mut params).await,
    Err(ObjectError::TokenSignatureInvalid)
  ));
  assert_eq!(f.memory.stored_objects(f.container).await, 0);
  assert!(drain(&mut events).is_empty());

  let record = f.next_notification().await;
  assert_eq!(record.severity, Severity::Error);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_aborted_sliced_create_leaves_nothing_listed() {
  let mut f = Fixture::build(
    MemoryNetworkConfig {
      max_object_size: 1000,
      ..Default::default()
    },
    Faults::default(),
    ExecutorConfig::default(),
  )
  .await;
  let mut forged = f.bearer();
  forged.expiry_epoch += 1;

  let (params, _) = f.params(Operation::Put, "", Credential::Delegated(forged));
  let mut params = params
    .with_gate_account(f.owner.clone())
    .with_stream(DualStream::new(MemorySource::new(payload(3000)), MemorySink::new()));
  assert!(matches!(
    f.executor.create(&mut params).await,
    Err(ObjectError::TokenSignatureInvalid)
  ));
  assert_eq!(f.next_notification().await.severity, Severity::Error);

  // parts cut before the abort stay behind but are not root objects
  assert_eq!(f.memory.stored_objects(f.container).await, 2);

  let (params, mut events) = f.params(Operation::Search, "", f.delegated());
  assert!(f.executor.list(&params).await.unwrap().is_empty());
  assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_created_descriptor_matches_head() {
  let f = Fixture::new().await;
  let (params, mut events) = f.params(Operation::Put, "", f.delegated());
  let mut params = params
    .with_stream(DualStream::new(MemorySource::new(payload(300)), MemorySink::new()))
    .with_attribute(ATTRIBUTE_FILE_NAME, "notes.txt");
  let id = f.executor.create(&mut params).await.unwrap();

  let created = drain(&mut events).remove(0).1;
  assert_eq!(created.attributes.get("payload_checksum").map(String::len), Some(64));

  let (params, _events) = f.params(Operation::Head, &id.to_string(), f.delegated());
  assert_eq!(f.executor.head(&params).await.unwrap(), created);
}

fn progress(events: &mut UnboundedReceiver<Event>) -> Vec<u8> {
  let mut out = Vec::new();
  while let Ok(event) = events.try_recv() {
    assert_eq!(event.topic, Topic::ProgressMessage);
    match event.payload {
      Payload::Progress(message) => out.push(message.progress),
      other => panic!("unexpected payload: {:?}", other),
    }
  }
  out
}

#[tokio::test]
async fn test_progress_is_reported_both_ways() {
  let mut f = Fixture::new().await;
  let data = payload(2048);

  let (emitter, mut upload_progress) = ChannelEmitter::channel();
  let upload = ProgressStream::new(
    DualStream::new(MemorySource::new(data.clone()), MemorySink::new()),
    Arc::new(emitter),
    "upload",
    Some(2048),
  );
  let (params, _) = f.params(Operation::Put, "", f.delegated());
  let mut params = params.with_stream(upload);
  let id = f.executor.create(&mut params).await.unwrap();
  assert_eq!(f.next_notification().await.severity, Severity::Success);
  assert_eq!(progress(&mut upload_progress), vec![50, 100]);

  let (params, _) = f.params(Operation::Get, &id.to_string(), f.delegated());
  let (header, source) = f.executor.init_reader(&params).await.unwrap();
  let (emitter, mut download_progress) = ChannelEmitter::channel();
  let sink = MemorySink::new();
  let download = ProgressStream::new(
    DualStream::new(source, sink.clone()),
    Arc::new(emitter),
    "download",
    Some(header.payload_size),
  );
  let mut params = params.with_stream(download);
  assert_eq!(f.executor.read(&mut params).await.unwrap(), 2048);
  assert_eq!(f.next_notification().await.severity, Severity::Success);
  assert_eq!(progress(&mut download_progress), vec![50, 100]);
  assert_eq!(sink.contents(), data);
}

#[tokio::test]
async fn test_create_without_stream() {
  let mut f = Fixture::new().await;
  let (mut params, _) = f.params(Operation::Put, "", f.delegated());

  assert!(matches!(f.executor.create(&mut params).await, Err(ObjectError::NoStream)));
  assert_eq!(f.network.calls(), 0);
  f.assert_quiet().await;
}

/// Fails after handing out a few bytes.
struct Broken {
  served: bool,
}

#[async_trait]
impl ByteSource for Broken {
  async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
    if self.served {
      return Err(StreamError::Io(std::io::Error::other("disk unplugged")));
    }
    self.served = true;
    buf[..4].copy_from_slice(b"part");
    Ok(4)
  }
}

#[tokio::test]
async fn test_read_failure_reports_error() {
  let mut f = Fixture::new().await;
  let id = ObjectId::from_bytes([7u8; 32]).to_string();
  let sink = MemorySink::new();

  let (params, _) = f.params(Operation::Get, &id, f.delegated());
  let mut params = params.with_stream(DualStream::new(Broken { served: false }, sink.clone()));

  match f.executor.read(&mut params).await {
    Err(ObjectError::Transfer { message }) => assert!(message.contains("disk unplugged")),
    other => panic!("expected transfer error, got {:?}", other),
  }
  assert_eq!(sink.contents(), b"part");
  assert!(!sink.is_closed());

  let record = f.next_notification().await;
  assert_eq!(record.severity, Severity::Error);
  f.assert_quiet().await;
}

#[tokio::test]
async fn test_cancelled_call_is_a_transfer_error() {
  let f = Fixture::new().await;
  let cancel = CancellationToken::new();
  cancel.cancel();

  let object = ObjectId::from_bytes([7u8; 32]).to_string();
  let (params, _) = f.params(Operation::Head, &object, f.delegated());
  let params = params.with_cancel(cancel);

  assert!(matches!(f.executor.head(&params).await, Err(ObjectError::Transfer { .. })));
}

#[tokio::test]
async fn test_failure_is_returned_when_dispatch_has_ended() {
  let f = Fixture::new().await;
  f.dispatcher.end();

  let missing = ObjectId::from_bytes([9u8; 32]).to_string();
  let (params, _) = f.params(Operation::Delete, &missing, f.delegated());

  let result = tokio::time::timeout(Duration::from_secs(1), f.executor.delete(&params))
    .await
    .expect("delete must not block on an ended dispatcher");
  assert!(matches!(result, Err(ObjectError::Transfer { .. })));
}
