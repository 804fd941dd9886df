use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use roadwatch_logging::rw_debug;
use tokio_util::sync::CancellationToken;

use crate::NotificationSeverity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: NotificationSeverity,
}

/// Where notifications are presented.
pub trait NotificationDisplay: Send + Sync {
    fn show(&self, notification: &Notification);
    fn hide(&self, notification: &Notification);
}

struct Shown {
    notification: Notification,
    hide_timer: CancellationToken,
}

/// Single-slot, auto-expiring notification area.
///
/// A new notification replaces the current one and cancels its hide timer, so
/// an older timer can never hide a newer notification.
pub struct NotificationSink {
    display: Arc<dyn NotificationDisplay>,
    ttl: Duration,
    current: Arc<Mutex<Option<Shown>>>,
    next_id: AtomicU64,
}

impl NotificationSink {
    pub fn new(display: Arc<dyn NotificationDisplay>, ttl: Duration) -> Self {
        Self {
            display,
            ttl,
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Shows `message` and schedules it to hide after the TTL. Must be called
    /// from within a tokio runtime.
    pub fn notify(&self, message: impl Into<String>, severity: NotificationSeverity) -> u64 {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            severity,
        };
        let hide_timer = CancellationToken::new();

        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Shown {
                notification: notification.clone(),
                hide_timer: hide_timer.clone(),
            });
        if let Some(previous) = previous {
            previous.hide_timer.cancel();
        }

        self.display.show(&notification);

        let current = self.current.clone();
        let display = self.display.clone();
        let ttl = self.ttl;
        let id = notification.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = hide_timer.cancelled() => {
                    rw_debug!("Hide timer for notification {} superseded", id);
                }
                _ = tokio::time::sleep(ttl) => {
                    let expired = {
                        let mut slot = current.lock().unwrap_or_else(PoisonError::into_inner);
                        match slot.as_ref() {
                            Some(shown) if shown.notification.id == id => slot.take(),
                            _ => None,
                        }
                    };
                    if let Some(shown) = expired {
                        display.hide(&shown.notification);
                    }
                }
            }
        });

        id
    }

    pub fn current(&self) -> Option<Notification> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|shown| shown.notification.clone())
    }
}
