use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Why a stall changed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeCause {
    Vote { voters: Vec<String> },
    Admin { admin: String },
    AutoClose,
}

/// A follow-up action offered alongside a notification. Transports render
/// these however they render choices (inline buttons, links, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyOption {
    pub label: String,
    pub action: String,
}

impl NotifyOption {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub stall_id: String,
    pub stall_name: String,
    pub is_open: bool,
    pub cause: ChangeCause,
    pub at: Timestamp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NotifyOption>,
}

impl Notification {
    pub fn text(&self) -> String {
        let (emoji, word) = if self.is_open {
            ("🟢", "OPEN")
        } else {
            ("🔴", "CLOSED")
        };
        let by = match &self.cause {
            ChangeCause::Vote { voters } => format!("Confirmed by: {}", voters.join(", ")),
            ChangeCause::Admin { admin } => format!("Updated by admin: {admin}"),
            ChangeCause::AutoClose => "Closed automatically at end of operating hours".to_string(),
        };
        format!(
            "{emoji} {} is now {word}\n{by}\n{}",
            self.stall_name,
            crate::render::format_timestamp(&self.at)
        )
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct NotifyError {
    pub recipient: String,
    pub reason: String,
}

impl NotifyError {
    pub fn new(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            reason: reason.into(),
        }
    }
}

/// Delivers one notification to one recipient.
///
/// Implementations must not block for long: dispatch runs right after a
/// commit on the caller's thread. Slow transports should queue and deliver
/// in the background.
pub trait Notifier: Send + Sync {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn deliver(&self, _recipient: &str, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps every delivery in memory; optionally fails for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient.into());
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), NotifyError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(recipient);
        if failing {
            return Err(NotifyError::new(recipient, "recipient unreachable"));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((recipient.to_string(), notification.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fan `notification` out to every distinct subscriber. A failed delivery is
/// logged and skipped; it never aborts the remaining deliveries.
pub fn notify_all(
    notifier: &dyn Notifier,
    subscribers: &[String],
    notification: &Notification,
) -> DispatchReport {
    let mut seen = HashSet::new();
    let mut report = DispatchReport::default();
    for recipient in subscribers {
        if !seen.insert(recipient.as_str()) {
            continue;
        }
        match notifier.deliver(recipient, notification) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!(stall = %notification.stall_id, "{e}");
                report.failed += 1;
            }
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
