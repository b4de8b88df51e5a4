//! Object action executor.
//!
//! Every operation walks the same stages: validate the request, authorize it,
//! execute the network calls, then report the outcome. A failure in the first
//! two stages returns without side effects. `create`, `read` and `delete`
//! report every outcome of the execute stage as one notification.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use kestrel_credential::{BearerToken, Operation, require_delegated, resolve_bearer};
use kestrel_emitter::{Emitter, Payload, Topic};
use kestrel_network::{ObjectHeader, ObjectNetwork, SearchFilters};
use kestrel_notification::Notifier;
use kestrel_transfer::{
  DuplexStream, RemoteSource, StreamError, UploadStream, WriteRequest, init_writer, pump,
};
use kestrel_types::{ContainerId, NotificationKind, ObjectDescriptor, ObjectId, Severity};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::descriptor::describe;
use crate::error::ObjectError;
use crate::params::ObjectParameters;

#[derive(Debug, Clone, Copy)]
enum Stage {
  Validating,
  Authorizing,
  Executing,
  Reporting,
}

impl Stage {
  fn as_str(self) -> &'static str {
    match self {
      Stage::Validating => "validating",
      Stage::Authorizing => "authorizing",
      Stage::Executing => "executing",
      Stage::Reporting => "reporting",
    }
  }
}

fn enter(stage: Stage) {
  debug!(stage = stage.as_str(), "entering stage");
}

/// Race a network call against cancellation.
async fn cancellable<T, E>(
  cancel: &CancellationToken,
  future: impl Future<Output = Result<T, E>>,
) -> Result<T, ObjectError>
where
  ObjectError: From<E>,
{
  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(ObjectError::cancelled()),
    result = future => result.map_err(ObjectError::from),
  }
}

/// Emit an object event whose delivery does not decide the outcome.
async fn announce(emitter: &dyn Emitter, topic: Topic, descriptor: ObjectDescriptor) {
  if let Err(e) = emitter.emit(topic, &Payload::Object(descriptor)).await {
    warn!(topic = %topic, error = %e, "could not emit object update");
  }
}

/// Executes object operations against an object network.
pub struct ObjectExecutor {
  network: Arc<dyn ObjectNetwork>,
  notifier: Arc<dyn Notifier>,
  config: ExecutorConfig,
}

impl ObjectExecutor {
  pub fn new(network: Arc<dyn ObjectNetwork>, notifier: Arc<dyn Notifier>) -> Self {
    Self::with_config(network, notifier, ExecutorConfig::default())
  }

  pub fn with_config(
    network: Arc<dyn ObjectNetwork>,
    notifier: Arc<dyn Notifier>,
    config: ExecutorConfig,
  ) -> Self {
    Self {
      network,
      notifier,
      config,
    }
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Describe an object and emit it as `object_add_update`.
  ///
  /// Never queues a notification; callers decide how to report failures.
  #[instrument(
    name = "object_head",
    skip(self, params),
    fields(container = %params.container_id, object = %params.object_id)
  )]
  pub async fn head(&self, params: &ObjectParameters) -> Result<ObjectDescriptor, ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;
    let object: ObjectId = params.object_id.parse()?;

    self.head_object(params, container, object).await
  }

  async fn head_object(
    &self,
    params: &ObjectParameters,
    container: ContainerId,
    object: ObjectId,
  ) -> Result<ObjectDescriptor, ObjectError> {
    enter(Stage::Authorizing);
    let bearer = resolve_bearer(&params.credential, Operation::Head)?;
    let signer = params.gate_account()?.signer();

    enter(Stage::Executing);
    let header = cancellable(
      &params.cancel,
      self.network.head(container, object, &signer, bearer),
    )
    .await?;
    let descriptor = describe(container, &header)?;

    enter(Stage::Reporting);
    params
      .emitter
      .emit(Topic::ObjectAddUpdate, &Payload::Object(descriptor.clone()))
      .await?;
    debug!(object = %descriptor.id, size = descriptor.size, "object described");
    Ok(descriptor)
  }

  /// Describe every root object of a container.
  ///
  /// Objects are described one after another in search order. The first
  /// failure stops the listing; objects described before it have already been
  /// emitted.
  #[instrument(name = "object_list", skip(self, params), fields(container = %params.container_id))]
  pub async fn list(&self, params: &ObjectParameters) -> Result<Vec<ObjectDescriptor>, ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;

    enter(Stage::Authorizing);
    let bearer = resolve_bearer(&params.credential, Operation::Search)?;
    let signer = params.gate_account()?.signer();

    enter(Stage::Executing);
    let mut filters = SearchFilters::new();
    filters.add_root_filter();
    let mut ids = cancellable(
      &params.cancel,
      self.network.search(container, &signer, bearer, filters),
    )
    .await?;

    let mut descriptors = Vec::new();
    loop {
      let next = tokio::select! {
        biased;
        _ = params.cancel.cancelled() => return Err(ObjectError::cancelled()),
        next = ids.next() => next,
      };
      let Some(object) = next else {
        break;
      };

      match self.head_object(params, container, object?).await {
        Ok(descriptor) => descriptors.push(descriptor),
        Err(e) => {
          warn!(listed = descriptors.len(), error = %e, "listing aborted");
          return Err(e);
        }
      }
    }

    info!(count = descriptors.len(), "container listed");
    Ok(descriptors)
  }

  /// Delete an object within the configured timeout.
  ///
  /// Only a delegated bearer token authorizes a delete.
  #[instrument(
    name = "object_delete",
    skip(self, params),
    fields(container = %params.container_id, object = %params.object_id)
  )]
  pub async fn delete(&self, params: &ObjectParameters) -> Result<(), ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;
    let object: ObjectId = params.object_id.parse()?;

    enter(Stage::Authorizing);
    let bearer = require_delegated(&params.credential, Operation::Delete)?;
    let signer = params.gate_account()?.signer();

    enter(Stage::Executing);
    let timeout = self.config.delete_timeout;
    let outcome = tokio::time::timeout(
      timeout,
      cancellable(
        &params.cancel,
        self.network.delete(container, object, &signer, bearer),
      ),
    )
    .await
    .unwrap_or_else(|_| Err(ObjectError::transfer(format!("delete timed out after {:?}", timeout))));

    enter(Stage::Reporting);
    let container = container.to_string();
    let object = object.to_string();
    let keyed = ObjectDescriptor::keyed(container.as_str(), object.as_str());
    match outcome {
      Ok(()) => {
        announce(params.emitter.as_ref(), Topic::ObjectRemoveUpdate, keyed).await;
        self
          .notify(
            &container,
            &object,
            "Delete complete",
            &format!("object {} deleted", object),
            Severity::Success,
          )
          .await?;
        info!("object deleted");
        Ok(())
      }
      Err(e) => {
        announce(params.emitter.as_ref(), Topic::ObjectFailed, keyed).await;
        self
          .report_failure(&container, &object, "Delete failed", &e)
          .await;
        Err(e)
      }
    }
  }

  /// Open the remote payload of an object.
  ///
  /// The returned source is meant to be joined with a local sink into a
  /// [`DualStream`](kestrel_transfer::DualStream) and handed to [`read`](Self::read).
  #[instrument(
    name = "object_init_reader",
    skip(self, params),
    fields(container = %params.container_id, object = %params.object_id)
  )]
  pub async fn init_reader(
    &self,
    params: &ObjectParameters,
  ) -> Result<(ObjectHeader, RemoteSource), ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;
    let object: ObjectId = params.object_id.parse()?;

    enter(Stage::Authorizing);
    let bearer = resolve_bearer(&params.credential, Operation::Get)?;
    let signer = params.gate_account()?.signer();

    enter(Stage::Executing);
    let (header, reader) = cancellable(
      &params.cancel,
      self.network.get_init(container, object, &signer, bearer),
    )
    .await?;
    debug!(size = header.payload_size, "opened payload reader");
    Ok((header, RemoteSource::new(reader)))
  }

  /// Pump the supplied stream until its source is exhausted, then close it.
  ///
  /// Returns the number of bytes moved.
  #[instrument(
    name = "object_read",
    skip(self, params),
    fields(container = %params.container_id, object = %params.object_id)
  )]
  pub async fn read(&self, params: &mut ObjectParameters) -> Result<u64, ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;
    let object: ObjectId = params.object_id.parse()?;
    let cancel = params.cancel.clone();
    let stream = params.stream.as_deref_mut().ok_or(ObjectError::NoStream)?;

    enter(Stage::Executing);
    let outcome = cancellable(&cancel, async move {
      let moved = pump(&mut *stream).await?;
      stream.close().await?;
      Ok::<u64, StreamError>(moved)
    })
    .await;

    enter(Stage::Reporting);
    let container = container.to_string();
    let object = object.to_string();
    match outcome {
      Ok(moved) => {
        self
          .notify(
            &container,
            &object,
            "Download complete",
            &format!("object {} completed", object),
            Severity::Success,
          )
          .await?;
        info!(bytes = moved, "object read");
        Ok(moved)
      }
      Err(e) => {
        self
          .report_failure(&container, &object, "Download failed", &e)
          .await;
        Err(e)
      }
    }
  }

  /// Upload the supplied stream as a new object.
  ///
  /// The remote writer is opened before any byte is read. Once the stream is
  /// exhausted the delegated token's signature is verified, and only then is
  /// the object finalized. Returns the identifier the network assigned.
  #[instrument(name = "object_create", skip(self, params), fields(container = %params.container_id))]
  pub async fn create(&self, params: &mut ObjectParameters) -> Result<ObjectId, ObjectError> {
    enter(Stage::Validating);
    let container: ContainerId = params.container_id.parse()?;
    if params.stream.is_none() {
      return Err(ObjectError::NoStream);
    }

    enter(Stage::Authorizing);
    let bearer = require_delegated(&params.credential, Operation::Put)?;
    let account = params.gate_account()?;
    let signer = account.signer();
    let owner = params.owner.unwrap_or_else(|| account.owner());

    let request = WriteRequest {
      container,
      owner,
      attributes: params.attributes.clone(),
      credential: &params.credential,
      signer: &signer,
    };
    let cancel = params.cancel.clone();
    let local = params.stream.as_deref_mut().ok_or(ObjectError::NoStream)?;

    enter(Stage::Executing);
    let outcome = self.upload(local, request, bearer, &cancel).await;

    enter(Stage::Reporting);
    let container_id = container.to_string();
    match outcome {
      Ok((header, id)) => {
        let descriptor = describe(container, &header).unwrap_or_else(|e| {
          warn!(error = %e, "created object header is not describable");
          ObjectDescriptor::keyed(container_id.as_str(), id.to_string())
        });
        announce(params.emitter.as_ref(), Topic::ObjectAddUpdate, descriptor).await;

        let id_str = id.to_string();
        self
          .notify(
            &container_id,
            &id_str,
            "Upload complete",
            &format!("object {} completed", id_str),
            Severity::Success,
          )
          .await?;
        info!(object = %id, bytes = header.payload_size, "object created");
        Ok(id)
      }
      Err(e) => {
        self
          .report_failure(&container_id, &params.object_id, "Upload failed", &e)
          .await;
        Err(e)
      }
    }
  }

  async fn upload(
    &self,
    local: &mut dyn DuplexStream,
    request: WriteRequest<'_>,
    bearer: &BearerToken,
    cancel: &CancellationToken,
  ) -> Result<(ObjectHeader, ObjectId), ObjectError> {
    let mut pending = cancellable(cancel, init_writer(self.network.as_ref(), request)).await?;

    let moved = {
      let mut upload = UploadStream::new(local, &mut pending);
      cancellable(cancel, pump(&mut upload)).await?
    };
    debug!(bytes = moved, "payload written");

    if !bearer.verify_signature() {
      return Err(ObjectError::TokenSignatureInvalid);
    }

    cancellable(cancel, pending.finish()).await
  }

  async fn notify(
    &self,
    container: &str,
    object: &str,
    title: &str,
    description: &str,
    severity: Severity,
  ) -> Result<(), ObjectError> {
    let record = self
      .notifier
      .notification(title, description, severity, NotificationKind::Notification)
      .with_meta("container", container)
      .with_meta("object", object);
    self.notifier.queue(record).await?;
    Ok(())
  }

  /// Queue the failure notification. The operation error wins over a queueing
  /// error, which is only logged.
  async fn report_failure(&self, container: &str, object: &str, title: &str, e: &ObjectError) {
    error!(error = %e, "{}", title);
    if let Err(queue_error) = self
      .notify(container, object, title, &e.to_string(), Severity::Error)
      .await
    {
      warn!(error = %queue_error, "could not queue failure notification");
    }
  }
}
