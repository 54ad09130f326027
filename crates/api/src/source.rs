use std::time::Duration;

use anyhow::{anyhow, Result};
use roster_core::entities::DetailSource;
use roster_core::{EntityKind, RawRecord};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::fixtures;

/// Supplies raw records per entity kind.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, kind: EntityKind) -> Result<Vec<RawRecord>>;

    /// Rows behind one metric of a daily report.
    async fn fetch_detail(&self, detail: DetailSource, date: &str) -> Result<Vec<RawRecord>> {
        let _ = date;
        self.fetch(detail.kind).await
    }

    /// Raw dashboard overview (summary, growth series, revenue per plan).
    async fn fetch_dashboard(&self) -> Result<RawRecord> { Err(anyhow!("dashboard not provided by this source")) }
}

/// Fixture-backed source with optional latency and per-kind failures.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    records: FxHashMap<EntityKind, Vec<RawRecord>>,
    failing: Vec<EntityKind>,
    dashboard_down: bool,
    delay: Duration,
}

impl MockSource {
    pub fn empty() -> Self { Self::default() }

    /// Every kind populated from [`fixtures`].
    pub fn fixtures() -> Self {
        let mut s = Self::default();
        for kind in EntityKind::ALL {
            s.records.insert(kind, fixtures::records(kind));
        }
        s
    }

    pub fn with(mut self, kind: EntityKind, records: Vec<RawRecord>) -> Self {
        self.records.insert(kind, records);
        self
    }

    pub fn failing(mut self, kind: EntityKind) -> Self {
        self.failing.push(kind);
        self
    }

    pub fn failing_dashboard(mut self) -> Self {
        self.dashboard_down = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait::async_trait]
impl DataSource for MockSource {
    async fn fetch(&self, kind: EntityKind) -> Result<Vec<RawRecord>> {
        self.pause().await;
        if self.failing.contains(&kind) {
            return Err(anyhow!("mock source: {kind} unavailable"));
        }
        let out = self.records.get(&kind).cloned().unwrap_or_default();
        debug!(%kind, count = out.len(), "mock source fetch");
        Ok(out)
    }

    async fn fetch_detail(&self, detail: DetailSource, date: &str) -> Result<Vec<RawRecord>> {
        self.pause().await;
        if self.failing.contains(&detail.kind) {
            return Err(anyhow!("mock source: {} details for {date} unavailable", detail.metric));
        }
        Ok(fixtures::report_detail(detail.metric))
    }

    async fn fetch_dashboard(&self) -> Result<RawRecord> {
        self.pause().await;
        if self.dashboard_down {
            return Err(anyhow!("mock source: dashboard unavailable"));
        }
        Ok(fixtures::dashboard())
    }
}
