//! Kestrel Emitter
//!
//! Events are emitted while objects are created, read and removed so that an
//! observer (a UI, a log) can follow along without being on the transfer path.
//!
//! The [`Emitter`] trait is the only thing the rest of kestrel knows about the
//! observer. [`LogEmitter`], [`ChannelEmitter`] and [`NoopEmitter`] cover
//! logging, asynchronous consumption and tests.

mod emitter;
mod event;

pub use emitter::{ChannelEmitter, EmitError, Emitter, LogEmitter, NoopEmitter};
pub use event::{Event, Payload, ProgressMessage, Topic};
