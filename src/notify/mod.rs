//! User-facing notifications
//!
//! The coordinator reports the outcome of user actions through a
//! [`NotificationPort`] handed to it at construction. Implementations decide
//! how the message reaches the user (console line, log event, toast).
//!
//! # Examples
//!
//! ```
//! use bizdeck::notify::{NotificationPort, RecordingNotifier, Level};
//!
//! let notifier = RecordingNotifier::new();
//! notifier.report_success("Card deleted successfully");
//! assert_eq!(notifier.last().unwrap().level, Level::Success);
//! ```

use colored::Colorize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Sink for success and failure messages
pub trait NotificationPort: Send + Sync {
    /// Tell the user an action succeeded
    fn report_success(&self, message: &str);

    /// Tell the user an action failed
    fn report_failure(&self, message: &str);
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Failure,
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Colored console lines: successes on stdout, failures on stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    #[must_use]
    pub const fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress success lines; failures are always printed
    #[must_use]
    pub const fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl NotificationPort for ConsoleNotifier {
    fn report_success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", "✓".green(), message);
        }
    }

    fn report_failure(&self, message: &str) {
        eprintln!("{} {}", "❌".red(), message.red());
    }
}

/// Emits notifications as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn report_success(&self, message: &str) {
        tracing::info!(target: "bizdeck::notify", "{message}");
    }

    fn report_failure(&self, message: &str) {
        tracing::warn!(target: "bizdeck::notify", "{message}");
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications, oldest first
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    /// Messages reported at `level`, oldest first
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.message.clone())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, level: Level, message: &str) {
        self.lock().push(Notification {
            level,
            message: message.to_string(),
        });
    }
}

impl NotificationPort for RecordingNotifier {
    fn report_success(&self, message: &str) {
        self.record(Level::Success, message);
    }

    fn report_failure(&self, message: &str) {
        self.record(Level::Failure, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.report_failure("Failed to delete card");
        notifier.report_success("Card deleted successfully");

        assert_eq!(
            notifier.notifications(),
            vec![
                Notification {
                    level: Level::Failure,
                    message: "Failed to delete card".into()
                },
                Notification {
                    level: Level::Success,
                    message: "Card deleted successfully".into()
                },
            ]
        );
        assert_eq!(notifier.messages(Level::Success), vec!["Card deleted successfully"]);

        notifier.clear();
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_ports_are_object_safe() {
        let ports: Vec<Arc<dyn NotificationPort>> = vec![
            Arc::new(ConsoleNotifier::quiet(true)),
            Arc::new(TracingNotifier),
            Arc::new(RecordingNotifier::new()),
        ];
        for port in &ports {
            port.report_success("ok");
        }
    }

    #[test]
    fn test_console_quiet_flag() {
        assert!(!ConsoleNotifier::new().is_quiet());
        assert!(ConsoleNotifier::quiet(true).is_quiet());
    }
}
