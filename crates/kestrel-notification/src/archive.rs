//! Durable archive of delivered notifications.

use std::sync::Arc;

use async_trait::async_trait;
use kestrel_emitter::{EmitError, Emitter, Payload, Topic};
use kestrel_store::{NOTIFICATION_BUCKET, Store};
use kestrel_types::NotificationRecord;
use tracing::debug;

use crate::error::DispatchError;

/// An emitter that archives notification records before forwarding them.
///
/// Every `notification_message` payload is stored as JSON under
/// [`NOTIFICATION_BUCKET`], keyed by the record id. Without a store those
/// emissions fail with [`EmitError::NoDatabase`]. Other topics pass straight
/// through to the inner emitter.
pub struct PersistingEmitter<E> {
  inner: E,
  store: Option<Arc<dyn Store>>,
}

impl<E: Emitter> PersistingEmitter<E> {
  pub fn new(inner: E, store: Option<Arc<dyn Store>>) -> Self {
    Self { inner, store }
  }

  pub fn inner(&self) -> &E {
    &self.inner
  }

  async fn persist(&self, record: &NotificationRecord) -> Result<(), EmitError> {
    let store = self.store.as_ref().ok_or(EmitError::NoDatabase)?;

    let value = serde_json::to_vec(record).map_err(|e| EmitError::Persistence {
      message: e.to_string(),
    })?;
    store
      .create(NOTIFICATION_BUCKET, &record.id, value)
      .await
      .map_err(|e| EmitError::Persistence {
        message: e.to_string(),
      })?;

    debug!(notification_id = %record.id, "notification archived");
    Ok(())
  }
}

#[async_trait]
impl<E: Emitter> Emitter for PersistingEmitter<E> {
  async fn emit(&self, topic: Topic, payload: &Payload) -> Result<(), EmitError> {
    if topic == Topic::NotificationMessage {
      let Payload::Notification(record) = payload else {
        return Err(EmitError::UnexpectedPayload { topic });
      };
      self.persist(record).await?;
    }
    self.inner.emit(topic, payload).await
  }
}

/// Read archived notification records back, oldest first.
///
/// Pass a recipient to keep only records addressed to them.
pub async fn archived_notifications(
  store: &dyn Store,
  recipient: Option<&str>,
) -> Result<Vec<NotificationRecord>, DispatchError> {
  let mut records = Vec::new();
  for (_, value) in store.list(NOTIFICATION_BUCKET).await? {
    let record: NotificationRecord = serde_json::from_slice(&value)?;
    if recipient.is_none_or(|r| r == record.user) {
      records.push(record);
    }
  }
  records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
  Ok(records)
}
