//! Gardener CLI entry point.
//!
//! This binary is the composition root for the workspace:
//!
//! 1. **Parse arguments and configuration** — CLI flags over `gardener.toml`
//!    over built-in defaults.
//! 2. **Wire observability** — `tracing-subscriber` with an env filter
//!    (`RUST_LOG`), optionally as JSON lines.
//! 3. **Construct infrastructure** — the GitHub tracker client, injected
//!    into the reconciler as its `TrackerClient` port.
//! 4. **Run one pass** and print the pass report.
//!
//! Exit codes: `0` clean pass, `1` pass completed with item-local failures,
//! `2` fatal error (nothing or only idempotent work done; safe to rerun).

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use board::{BoardNumber, BoardRef, OrgName, RetryPolicy};
use github::GithubTracker;
use reconciler::{PassError, PassReport, Reconciler};

/// Keeps a project board synchronized with the work items it tracks.
#[derive(Debug, Parser)]
#[command(name = "gardener", version, about)]
struct Cli {
    /// Organization that owns the board.
    #[arg(long, env = "GARDENER_ORG")]
    org: String,

    /// Board (project) number within the organization.
    #[arg(long, env = "GARDENER_PROJECT")]
    project: u64,

    /// Log every mutating call and skip it.
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Path to a TOML configuration file (default: ./gardener.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum repositories swept concurrently.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the pass report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(report) if report.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<PassReport> {
    let mut engine_config = config::load(cli.config.as_deref())?;
    engine_config.dry_run |= cli.dry_run;
    if let Some(concurrency) = cli.concurrency {
        engine_config.sweep_concurrency = concurrency;
    }

    let board = BoardRef {
        org: OrgName::new(cli.org.as_str()).context("--org must not be empty")?,
        number: BoardNumber::new(cli.project),
    };

    let token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN must be set")?;
    let tracker = GithubTracker::new(&token).context("could not construct GitHub client")?;

    let reconciler = Reconciler::new(Arc::new(tracker), board, engine_config);
    let report = reconciler.run().await.map_err(augment_pass_error)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(report)
}

/// Attaches a rerun hint based on the underlying retry policy.
fn augment_pass_error(error: PassError) -> anyhow::Error {
    let hint = match &error {
        PassError::Catalog { source, .. }
        | PassError::BoardItems { source, .. }
        | PassError::Repositories { source, .. } => match source.retry_policy() {
            RetryPolicy::Retryable { after: Some(after) } => {
                format!("transient failure; retry after {}s", after.as_secs())
            }
            RetryPolicy::Retryable { after: None } => "transient failure; safe to rerun".into(),
            RetryPolicy::NonRetryable => "needs operator attention before rerunning".into(),
        },
    };
    anyhow::Error::new(error).context(hint)
}

fn print_summary(report: &PassReport) {
    println!("pass {} {}", report.pass_id, if report.dry_run { "(dry-run)" } else { "" });
    println!(
        "  items: {} visited, {} without content",
        report.items_visited, report.items_without_content
    );
    println!(
        "  mutations: {} planned, {} applied, {} failed",
        report.mutations_planned, report.mutations_applied, report.mutations_failed
    );
    println!(
        "  dispatches: {} ({} failed)",
        report.dispatches, report.dispatches_failed
    );
    println!(
        "  sweep: {} orphans enrolled, {} enrollments failed, {} repos failed",
        report.orphans_enrolled, report.enrollments_failed, report.repos_failed
    );
    for stale in &report.stale_items {
        println!(
            "  stale: {}#{} \"{}\" inactive {} days",
            stale.repo, stale.number, stale.title, stale.days_inactive
        );
    }
}

fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
