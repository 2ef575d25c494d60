// ── User-facing notifications ──
//
// Every load and mutation path ends in "show a notification, keep prior
// state" rather than propagating a failure to the screen. The Notifier
// trait is the seam a UI plugs its toast layer into.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl dyn Notifier {
    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::new(Level::Success, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Notification::new(Level::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::new(Level::Error, message));
    }
}

// ── Tracing sink ─────────────────────────────────────────────────────

/// Forwards notifications to `tracing`. The default when nothing else
/// is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { level, message } = notification;
        match level {
            Level::Success | Level::Info => info!(%level, "{message}"),
            Level::Warning => warn!("{message}"),
            Level::Error => error!("{message}"),
        }
    }
}

// ── Recording sink ───────────────────────────────────────────────────

/// Buffers notifications until a UI drains them. Optionally forwards
/// each one to another notifier as it arrives.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
    forward: Option<Arc<dyn Notifier>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also pass every notification on to `next`.
    pub fn forwarding_to(next: Arc<dyn Notifier>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            forward: Some(next),
        }
    }

    /// Take every buffered notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of the buffered notifications.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of buffered notifications at `level`.
    pub fn count(&self, level: Level) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        if let Some(ref next) = self.forward {
            next.notify(notification.clone());
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

impl std::fmt::Debug for NotificationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationLog")
            .field("entries", &self.snapshot())
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_counts_and_drains() {
        let log = Arc::new(NotificationLog::new());
        let notifier: Arc<dyn Notifier> = log.clone();
        notifier.error("boom");
        notifier.success("ok");
        notifier.error("again");

        assert_eq!(log.count(Level::Error), 2);
        assert_eq!(log.count(Level::Success), 1);

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].message, "boom");
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn log_forwards() {
        let inner = Arc::new(NotificationLog::new());
        let outer = NotificationLog::forwarding_to(inner.clone());
        outer.notify(Notification::new(Level::Warning, "careful"));
        assert_eq!(inner.count(Level::Warning), 1);
        assert_eq!(outer.count(Level::Warning), 1);
    }
}
