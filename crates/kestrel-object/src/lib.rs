//! Kestrel Object
//!
//! The object action executor. [`ObjectExecutor`] turns an
//! [`ObjectParameters`] request into authorized calls against an
//! [`ObjectNetwork`](kestrel_network::ObjectNetwork):
//!
//! - `head` and `list` describe objects and emit `object_add_update` events.
//! - `create` and `read` stream payloads through the caller's duplex stream.
//! - `delete` removes an object within a bounded time.
//!
//! Once `create`, `read` or `delete` starts executing, its outcome is reported
//! as exactly one notification record queued on the executor's notifier.

mod config;
mod descriptor;
mod error;
mod executor;
mod params;

pub use config::ExecutorConfig;
pub use descriptor::{PAYLOAD_CHECKSUM_ATTRIBUTE, describe};
pub use error::ObjectError;
pub use executor::ObjectExecutor;
pub use params::ObjectParameters;
