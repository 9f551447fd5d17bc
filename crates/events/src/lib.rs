//! User-facing transient notifications.
//!
//! [`NotificationEmitter`] is a producer-agnostic sink: anything that
//! wants to tell the user something short-lived calls
//! [`emit`](NotificationEmitter::emit), and views observe the single
//! visible notification through a `tokio::sync::watch` channel.

pub mod notification;

pub use notification::{Notification, NotificationEmitter, Severity, NOTIFICATION_TTL};
