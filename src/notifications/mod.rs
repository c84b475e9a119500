//! Outbound notifications.
//!
//! Email is the only channel. Delivery failures are logged and counted,
//! never surfaced to the submitter: by the time a notification fires the
//! record is already durable.

pub mod dispatch;
pub mod mailer;

pub use dispatch::dispatch;
pub use mailer::{HttpMailer, MailError, Mailer, NullMailer, OutboundEmail};
