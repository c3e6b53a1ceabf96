pub mod handle_notification;
pub mod register_transaction;

pub use handle_notification::{HandleNotification, NotificationOutcome, Reply};
pub use register_transaction::{RegisterTransaction, Registration};
