//! Kestrel Types
//!
//! Data shared between the object executor, the notification dispatcher, the
//! network boundary and the observers they report to.

mod id;
mod notification;
mod object;

pub use id::{ContainerId, IdError, ObjectId, OwnerId};
pub use notification::{NotificationKind, NotificationRecord, Severity};
pub use object::ObjectDescriptor;
