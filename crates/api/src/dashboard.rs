use std::time::Instant;

use roster_core::Dashboard;
use tracing::{info, warn};

use crate::{DataSource, Notifier, RosterError, RosterResult};

/// Fetch and normalize the dashboard overview. A failure is reported to the
/// notifier and returned; nothing is cached.
pub async fn load_dashboard(source: &dyn DataSource, notifier: &dyn Notifier) -> RosterResult<Dashboard> {
    let t0 = Instant::now();
    match source.fetch_dashboard().await {
        Ok(raw) => {
            let dashboard = Dashboard::normalize(&raw);
            metrics::counter!("roster_load_total", 1u64, "kind" => "dashboard", "outcome" => "ok");
            info!(
                points = dashboard.user_growth.len(),
                plans = dashboard.revenue_by_plan.len(),
                took_ms = %t0.elapsed().as_millis(),
                "dashboard loaded"
            );
            Ok(dashboard)
        }
        Err(e) => {
            metrics::counter!("roster_load_total", 1u64, "kind" => "dashboard", "outcome" => "error");
            warn!(error = %e, "dashboard load failed");
            notifier.failure("Failed to load dashboard");
            Err(RosterError::Load(e.to_string()))
        }
    }
}
