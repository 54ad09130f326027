use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Failure,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sink for user-facing outcome messages (toasts in a UI).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn success(&self, message: &str) { self.notify(NoticeLevel::Success, message) }
    fn failure(&self, message: &str) { self.notify(NoticeLevel::Failure, message) }
    fn info(&self, message: &str) { self.notify(NoticeLevel::Info, message) }
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Failure => warn!(target: "roster::notice", "{message}"),
            _ => info!(target: "roster::notice", ?level, "{message}"),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self { Self::default() }

    pub fn notices(&self) -> Vec<Notice> { self.notices.lock().map(|n| n.clone()).unwrap_or_default() }

    pub fn take(&self) -> Vec<Notice> { self.notices.lock().map(|mut n| std::mem::take(&mut *n)).unwrap_or_default() }

    pub fn last(&self) -> Option<Notice> { self.notices.lock().ok().and_then(|n| n.last().cloned()) }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut n) = self.notices.lock() {
            n.push(Notice { level, message: message.to_string() });
        }
    }
}
