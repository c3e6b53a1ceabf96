//! Framework-agnostic protocol types.

pub mod fields;
pub mod notification;
pub mod transaction;

pub use fields::{keys, Fields, ACCEPTED_REGISTRATION_STATUSES};
pub use notification::RawNotification;
pub use transaction::{Exchange, Transaction};
