#![forbid(unsafe_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use roster_api::{
    Action, ActionOutcome, Actionable, Coordinator, DataSource, LoadOutcome, MockRemote, MockSource, RecordingNotifier,
    RosterConfig, TracingNotifier,
};
use roster_core::format::{format_currency, format_number, ExportFormat};
use roster_core::prelude::*;
use tracing::{info, warn};

mod render;

use render::Row;

#[derive(Parser, Debug)]
#[command(name = "rosterctl", version, about = "Roster CLI over the mock admin data")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(clap::Args, Debug, Clone, Default)]
struct ViewArgs {
    /// Case-insensitive substring over the searchable fields
    #[arg(long = "search", short = 's')]
    search: Option<String>,
    /// Equality filter, repeatable: key=value
    #[arg(long = "filter", short = 'f')]
    filters: Vec<String>,
    /// Sort key (entity specific, e.g. newest, balance)
    #[arg(long = "sort")]
    sort: Option<String>,
    /// 1-based page
    #[arg(long = "page", default_value_t = 1)]
    page: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List one page of records
    Ls {
        /// users, transactions, reports, tickets, posts, downloads
        kind: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Apply an action to one record and print the result
    Act {
        kind: String,
        id: String,
        /// suspend, enable, verify, unverify, delete, close-ticket, send-reply,
        /// start-progress, reopen, update-progress
        action: String,
        /// Close reason, reply text or progress delta
        #[arg(long = "arg")]
        arg: Option<String>,
        /// Make the remote round trip fail
        #[arg(long = "fail", action = ArgAction::SetTrue)]
        fail: bool,
    },
    /// Print one record for the clipboard
    Export {
        kind: String,
        id: String,
        #[arg(long = "format", default_value = "text")]
        format: String,
    },
    /// List the rows behind one metric of a daily report
    Report {
        /// Report date, e.g. 2025-10-18
        date: String,
        /// users, deposits, withdrawals, posts, affiliateBonuses
        metric: String,
    },
    /// Overview: summary counters, user growth and revenue per plan
    Dashboard,
    /// Advance a download until it completes
    Simulate {
        id: String,
        /// Percent added per step
        #[arg(long = "step", default_value_t = 20.0)]
        step: f64,
        #[arg(long = "interval-ms", default_value_t = 200)]
        interval_ms: u64,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ls { .. } => "ls",
            Commands::Act { .. } => "act",
            Commands::Export { .. } => "export",
            Commands::Report { .. } => "report",
            Commands::Dashboard => "dashboard",
            Commands::Simulate { .. } => "simulate",
        }
    }
}

fn init_tracing() {
    let env = std::env::var("ROSTER_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ROSTER_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ROSTER_METRICS_ADDR; expected host:port");
        }
    }
}

struct Env {
    cfg: RosterConfig,
    source: MockSource,
    output: Output,
}

impl Env {
    fn delay(&self) -> Duration { Duration::from_millis(self.cfg.mock_delay_ms) }

    async fn coordinator<E: Actionable>(&self, notifier: Arc<dyn roster_api::Notifier>) -> Result<Coordinator<E>> {
        let mut c = Coordinator::with_config(&self.cfg, notifier);
        match c.load(&self.source).await {
            LoadOutcome::Applied(report) if report.rejected > 0 => {
                warn!(kind = %E::KIND, rejected = report.rejected, "some records had no id")
            }
            LoadOutcome::Failed(e) => return Err(anyhow!(e)),
            _ => {}
        }
        Ok(c)
    }
}

fn print_page<E: Entity + Row>(env: &Env, slice: &roster_api::VisibleSlice<E>) -> Result<()> {
    match env.output {
        Output::Human => {
            println!("{}", E::header());
            for item in &slice.items {
                println!("{}", item.row());
            }
            println!("-- page {}/{} ({} matching)", slice.page, slice.total_pages, slice.total_matches);
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(slice)?),
    }
    Ok(())
}

fn parse_filter(f: &str) -> Result<(&str, &str)> {
    let (k, v) = f.split_once('=').ok_or_else(|| anyhow!("filter must be key=value: {f}"))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(anyhow!("filter key is empty: {f}"));
    }
    Ok((k, v.trim()))
}

fn apply_view<E: Actionable>(c: &mut Coordinator<E>, view: &ViewArgs) -> Result<()> {
    if let Some(s) = &view.search {
        c.set_search(s.clone());
    }
    for f in &view.filters {
        let (k, v) = parse_filter(f)?;
        if !E::schema().filters.contains(&k) {
            warn!(kind = %E::KIND, key = k, "not a filterable field; nothing will match");
        }
        c.set_filter(k, v);
    }
    if let Some(s) = &view.sort {
        if E::schema().sort_spec(s).is_none() {
            warn!(kind = %E::KIND, sort = %s, "unknown sort key; using default");
        }
        c.set_sort(s.clone());
    }
    c.set_page(view.page);
    Ok(())
}

async fn ls<E: Actionable + Row>(env: &Env, view: &ViewArgs) -> Result<()> {
    let mut c = env.coordinator::<E>(Arc::new(TracingNotifier)).await?;
    apply_view(&mut c, view)?;
    let slice = c.visible();
    print_page(env, &slice)
}

async fn act<E: Actionable + Row>(env: &Env, id: &str, action: Action, fail: bool) -> Result<()> {
    let notes = Arc::new(RecordingNotifier::new());
    let mut c = env.coordinator::<E>(notes.clone()).await?;
    let remote = if fail { MockRemote::failing() } else { MockRemote::new() };
    let remote = remote.with_delay(env.delay());
    let outcome = c.act(&remote, id, action).await;
    info!(kind = %E::KIND, id, outcome = ?outcome, "act finished");
    match env.output {
        Output::Human => {
            for n in notes.take() {
                println!("[{:?}] {}", n.level, n.message);
            }
            match (&outcome, c.collection().get(id)) {
                (ActionOutcome::NoOp, _) => println!("no {} with id {id}", E::KIND),
                (_, Some(rec)) => {
                    println!("{}", E::header());
                    println!("{}", rec.row());
                }
                (_, None) => println!("{} {id} removed", E::KIND),
            }
        }
        Output::Json => {
            let body = serde_json::json!({
                "outcome": match &outcome {
                    ActionOutcome::Committed => "committed".to_string(),
                    ActionOutcome::NoOp => "noop".to_string(),
                    ActionOutcome::Failed(e) => e.to_string(),
                },
                "record": c.collection().get(id),
                "notices": notes.take(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    match outcome {
        ActionOutcome::Failed(e) => Err(anyhow!(e)),
        _ => Ok(()),
    }
}

async fn export<E: Actionable>(env: &Env, id: &str, fmt: ExportFormat) -> Result<()> {
    let c = env.coordinator::<E>(Arc::new(TracingNotifier)).await?;
    print!("{}", c.export(id, fmt)?);
    if fmt == ExportFormat::Json {
        println!();
    }
    Ok(())
}

async fn report_detail(env: &Env, date: &str, metric: &str) -> Result<()> {
    let mut reports = env.coordinator::<Report>(Arc::new(TracingNotifier)).await?;
    let detail = reports.open_detail(date, metric)?;
    let rows = env.source.fetch_detail(detail, date).await?;
    info!(metric, date, rows = rows.len(), "report drill-down");
    async fn show<E: Actionable + Row>(env: &Env, rows: Vec<RawRecord>) -> Result<()> {
        let mut c = Coordinator::<E>::with_config(&env.cfg, Arc::new(TracingNotifier));
        let ticket = c.begin_load();
        c.complete_load(ticket, Ok(rows));
        let slice = c.visible();
        print_page(env, &slice)
    }
    match detail.kind {
        EntityKind::User => show::<User>(env, rows).await,
        EntityKind::Transaction => show::<Transaction>(env, rows).await,
        EntityKind::Post => show::<Post>(env, rows).await,
        other => Err(anyhow!("no drill-down list for {other}")),
    }
}

async fn dashboard(env: &Env) -> Result<()> {
    let d = roster_api::load_dashboard(&env.source, &TracingNotifier).await?;
    if env.output == Output::Json {
        println!("{}", serde_json::to_string_pretty(&d)?);
        return Ok(());
    }
    let s = &d.summary;
    println!("users       {}", format_number(s.total_users as f64, 0));
    println!("posts today {}", format_number(s.posts_today as f64, 0));
    println!("revenue     {}", format_currency(s.total_revenue));
    println!("new signups {}", format_number(s.new_signups as f64, 0));
    if let (Some(first), Some(last)) = (d.user_growth.first(), d.user_growth.last()) {
        println!("-- user growth {} .. {} ({:+})", first.date, last.date, d.growth());
        for p in &d.user_growth {
            println!("{:<12} {}", p.date, format_number(p.users as f64, 0));
        }
    }
    println!("-- revenue by plan");
    for p in &d.revenue_by_plan {
        println!("{:<12} {}", p.plan, format_currency(p.revenue));
    }
    println!("{:<12} {}", "total", format_currency(d.plan_revenue_total()));
    if let Some(top) = d.top_plan() {
        println!("top plan: {}", top.plan);
    }
    Ok(())
}

async fn simulate(env: &Env, id: &str, step: f64, interval: Duration) -> Result<()> {
    let mut c = env.coordinator::<Download>(Arc::new(TracingNotifier)).await?;
    let remote = MockRemote::new().with_delay(env.delay());
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let d = c.collection().get(id).ok_or_else(|| anyhow!("no download with id {id}"))?;
        if d.status == DownloadStatus::Completed {
            break;
        }
        if let ActionOutcome::Failed(e) = c.act(&remote, id, Action::UpdateProgress { delta: step }).await {
            return Err(anyhow!(e));
        }
        if let (Output::Human, Some(d)) = (env.output, c.collection().get(id)) {
            println!("{}", d.row());
        }
    }
    info!(id, took_ms = %started.elapsed().as_millis(), "download completed");
    if env.output == Output::Json {
        println!("{}", serde_json::to_string_pretty(&c.collection().get(id))?);
    }
    Ok(())
}

macro_rules! dispatch {
    ($kind:expr, $f:ident ( $($arg:expr),* )) => {
        match $kind {
            EntityKind::User => $f::<User>($($arg),*).await,
            EntityKind::Transaction => $f::<Transaction>($($arg),*).await,
            EntityKind::Report => $f::<Report>($($arg),*).await,
            EntityKind::Ticket => $f::<Ticket>($($arg),*).await,
            EntityKind::Post => $f::<Post>($($arg),*).await,
            EntityKind::Download => $f::<Download>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let cfg = RosterConfig::from_env();
    let source = MockSource::fixtures().with_delay(Duration::from_millis(cfg.mock_delay_ms));
    let env = Env { cfg, source, output: cli.output };
    let started = Instant::now();
    let name = cli.command.name();

    match cli.command {
        Commands::Ls { kind, view } => {
            let kind: EntityKind = kind.parse()?;
            info!(%kind, "ls invoked");
            dispatch!(kind, ls(&env, &view))?;
        }
        Commands::Act { kind, id, action, arg, fail } => {
            let kind: EntityKind = kind.parse()?;
            let action = Action::from_parts(&action, arg.as_deref())?;
            info!(%kind, id = %id, action = action.name(), "act invoked");
            dispatch!(kind, act(&env, &id, action, fail))?;
        }
        Commands::Export { kind, id, format } => {
            let kind: EntityKind = kind.parse()?;
            let fmt: ExportFormat = format.parse().map_err(|e: String| anyhow!(e))?;
            dispatch!(kind, export(&env, &id, fmt))?;
        }
        Commands::Report { date, metric } => report_detail(&env, &date, &metric).await?,
        Commands::Dashboard => dashboard(&env).await?,
        Commands::Simulate { id, step, interval_ms } => {
            if !(step.is_finite() && step > 0.0) {
                return Err(anyhow!("--step must be a positive number"));
            }
            simulate(&env, &id, step, Duration::from_millis(interval_ms)).await?;
        }
    }
    metrics::histogram!("rosterctl_command_ms", started.elapsed().as_secs_f64() * 1000.0, "command" => name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_args_split_on_first_equals() {
        assert_eq!(parse_filter("status=open").unwrap(), ("status", "open"));
        assert_eq!(parse_filter(" plan = a=b ").unwrap(), ("plan", "a=b"));
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=open").is_err());
    }

    #[test]
    fn cli_parses_ls_with_view_flags() {
        let cli = Cli::try_parse_from(["rosterctl", "-o", "json", "ls", "tickets", "-f", "status=open", "--sort", "priority", "--page", "2"]).unwrap();
        assert_eq!(cli.output, Output::Json);
        match cli.command {
            Commands::Ls { kind, view } => {
                assert_eq!(kind, "tickets");
                assert_eq!(view.filters, vec!["status=open".to_string()]);
                assert_eq!(view.sort.as_deref(), Some("priority"));
                assert_eq!(view.page, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_act_with_arg() {
        let cli = Cli::try_parse_from(["rosterctl", "act", "ticket", "TICKET001", "close-ticket", "--arg", "done"]).unwrap();
        assert_eq!(cli.output, Output::Human);
        match cli.command {
            Commands::Act { action, arg, fail, .. } => {
                let action = Action::from_parts(&action, arg.as_deref()).unwrap();
                assert_eq!(action, Action::CloseTicket { reason: Some("done".into()) });
                assert!(!fail);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn ls_pages_fixture_users() {
        let env = Env { cfg: RosterConfig::default(), source: MockSource::fixtures(), output: Output::Json };
        let mut c = env.coordinator::<User>(Arc::new(TracingNotifier)).await.unwrap();
        apply_view(&mut c, &ViewArgs { page: 1, ..ViewArgs::default() }).unwrap();
        let slice = c.visible();
        assert_eq!(slice.page, 1);
        assert!(slice.total_matches > 0);
    }

    #[test]
    fn cli_parses_dashboard() {
        let cli = Cli::try_parse_from(["rosterctl", "-o", "json", "dashboard"]).unwrap();
        assert_eq!(cli.command.name(), "dashboard");
        assert_eq!(cli.output, Output::Json);
    }

    #[tokio::test]
    async fn dashboard_renders_fixture_and_fails_when_source_is_down() {
        let env = Env { cfg: RosterConfig::default(), source: MockSource::fixtures(), output: Output::Human };
        dashboard(&env).await.unwrap();
        let env = Env { source: MockSource::fixtures().failing_dashboard(), ..env };
        assert!(dashboard(&env).await.is_err());
    }
}
