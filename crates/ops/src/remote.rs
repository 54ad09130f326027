use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use roster_core::EntityKind;
use tracing::debug;

use crate::Action;

/// Remote round trip confirming an action. Success means the change may be
/// committed locally.
#[async_trait::async_trait]
pub trait RemoteActions: Send + Sync {
    async fn submit(&self, kind: EntityKind, id: &str, action: &Action) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub kind: EntityKind,
    pub id: String,
    pub action: Action,
}

/// In-process stand-in for a backend: optional delay, scripted failures and
/// a log of every call.
#[derive(Debug, Default)]
pub struct MockRemote {
    delay: Duration,
    fail_all: bool,
    scripted: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MockRemote {
    pub fn new() -> Self { Self::default() }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing() -> Self { Self { fail_all: true, ..Self::default() } }

    /// Queue outcomes for upcoming calls (`true` = success); afterwards calls succeed.
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        if let Ok(mut q) = self.scripted.lock() {
            q.extend(outcomes);
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> { self.calls.lock().map(|c| c.clone()).unwrap_or_default() }
}

#[async_trait::async_trait]
impl RemoteActions for MockRemote {
    async fn submit(&self, kind: EntityKind, id: &str, action: &Action) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RemoteCall { kind, id: id.to_string(), action: action.clone() });
        }
        let ok = !self.fail_all && self.scripted.lock().ok().and_then(|mut q| q.pop_front()).unwrap_or(true);
        debug!(%kind, id, action = action.name(), ok, "mock remote");
        if ok { Ok(()) } else { Err(anyhow!("remote rejected {} on {kind} {id}", action.name())) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_outcomes_then_success() {
        let remote = MockRemote::new();
        remote.script([false, true]);
        assert!(remote.submit(EntityKind::User, "1", &Action::Verify).await.is_err());
        assert!(remote.submit(EntityKind::User, "1", &Action::Verify).await.is_ok());
        assert!(remote.submit(EntityKind::User, "2", &Action::Delete).await.is_ok());
        assert_eq!(remote.calls().len(), 3);
        assert!(MockRemote::failing().submit(EntityKind::Ticket, "t", &Action::Reopen).await.is_err());
    }
}
