//! Kestrel Notification
//!
//! Object operations report their outcome as [`NotificationRecord`]s. Records
//! are queued on a [`Dispatcher`], drained by a single background task in the
//! order they were queued and handed to an [`Emitter`] under
//! `notification_message`. Wrapping that emitter in a [`PersistingEmitter`]
//! archives each record in a [`Store`](kestrel_store::Store).
//!
//! [`NotificationRecord`]: kestrel_types::NotificationRecord
//! [`Emitter`]: kestrel_emitter::Emitter

mod archive;
mod config;
mod dispatcher;
mod error;

pub use archive::{PersistingEmitter, archived_notifications};
pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, Notifier, QUEUE_CAPACITY};
pub use error::DispatchError;
