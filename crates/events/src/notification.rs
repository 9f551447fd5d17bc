//! Single-slot, auto-expiring notifications.
//!
//! Only one notification is visible at a time. Emitting a new one replaces
//! the current one and restarts the expiry timer; the superseded timer is
//! aborted so it can never dismiss its successor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use genstudio_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

/// A short-lived message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationEmitter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Expiry {
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

/// Owns the visible notification and its dismissal timer.
///
/// Share it via `Arc<NotificationEmitter>` between producers. Emitting
/// spawns the expiry timer, so [`emit`](Self::emit) must be called from
/// within a Tokio runtime.
pub struct NotificationEmitter {
    current: Arc<watch::Sender<Option<Notification>>>,
    expiry: Mutex<Expiry>,
    ttl: Duration,
}

impl NotificationEmitter {
    /// Create an emitter whose notifications expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            expiry: Mutex::new(Expiry::default()),
            ttl,
        }
    }

    /// Show `message`, replacing whatever is currently visible, and
    /// (re)start the dismissal timer.
    ///
    /// Returns the id of the new notification, or `None` if the emitter
    /// has been closed.
    pub fn emit(&self, message: impl Into<String>, severity: Severity) -> Option<Uuid> {
        let mut expiry = self.lock_expiry();
        if expiry.closed {
            tracing::debug!("Notification dropped, emitter closed");
            return None;
        }

        if let Some(timer) = expiry.timer.take() {
            timer.abort();
        }

        let notification = Notification::new(message, severity);
        let id = notification.id;
        tracing::debug!(
            notification_id = %id,
            severity = ?severity,
            message = %notification.message,
            "Showing notification",
        );
        self.current.send_replace(Some(notification));

        let current = Arc::clone(&self.current);
        let ttl = self.ttl;
        expiry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            dismiss_if_current(&current, id);
        }));

        Some(id)
    }

    /// The notification currently visible, if any.
    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    /// Subscribe to changes of the visible notification.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.current.subscribe()
    }

    /// Hide the current notification, cancel its timer, and ignore all
    /// further emissions. Idempotent.
    pub fn close(&self) {
        let mut expiry = self.lock_expiry();
        expiry.closed = true;
        if let Some(timer) = expiry.timer.take() {
            timer.abort();
        }
        self.current.send_replace(None);
    }

    pub fn is_closed(&self) -> bool {
        self.lock_expiry().closed
    }

    fn lock_expiry(&self) -> MutexGuard<'_, Expiry> {
        self.expiry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationEmitter {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}

impl Drop for NotificationEmitter {
    fn drop(&mut self) {
        let expiry = self.expiry.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = expiry.timer.take() {
            timer.abort();
        }
    }
}

/// Clear the slot only if it still holds notification `id`.
fn dismiss_if_current(current: &watch::Sender<Option<Notification>>, id: Uuid) {
    let dismissed = current.send_if_modified(|slot| {
        if slot.as_ref().is_some_and(|notification| notification.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    });
    if dismissed {
        tracing::debug!(notification_id = %id, "Notification expired");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
