//! Pagemedic - Automated Page Regression & Repair-Advisory CLI
//!
//! ## Commands
//!
//! - `run`: probe every page in a route manifest, classify failures,
//!   attempt repairs, and write a report artifact
//! - `validate`: parse and validate a route manifest
//! - `render`: re-render Markdown from a stored report artifact
//!
//! Exit codes for `run`: 0 clean, 1 unrepaired errors remain, 2 fatal
//! driver error (a partial report is still written).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use pagemedic_core::planner::StrategyTable;
use pagemedic_core::report::Report;
use pagemedic_core::{
    init_tracing, load_manifest, read_report_artifact, render_markdown, write_report_json,
    write_report_md,
};
use pagemedic_engine::advisor::standard_registry;
use pagemedic_engine::driver::DriverFactory;
use pagemedic_engine::drivers::http::HttpDriverFactory;
use pagemedic_engine::drivers::replay::ReplayDriverFactory;
use pagemedic_engine::executor::MethodRegistry;
use pagemedic_engine::orchestrator::{Orchestrator, RunConfig};

#[derive(Parser)]
#[command(name = "pagemedic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated page regression and repair-advisory engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every manifest target, classify and repair, write a report
    Run {
        /// Path to the route manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Maximum concurrent probes
        #[arg(short, long, default_value = "4")]
        concurrency: usize,

        /// Per-probe timeout in milliseconds
        #[arg(short, long, default_value = "10000")]
        timeout: u64,

        /// Base URL for the HTTP driver session
        #[arg(long, env = "PAGEMEDIC_BASE_URL")]
        base_url: Option<String>,

        /// Pre-acquired auth header for the HTTP session ("Name: value")
        #[arg(long, env = "PAGEMEDIC_AUTH_HEADER")]
        auth_header: Option<String>,

        /// Replay fixture file instead of live HTTP probing
        #[arg(long)]
        fixtures: Option<PathBuf>,

        /// Directory for report artifacts
        #[arg(long, default_value = ".pagemedic/reports")]
        out_dir: PathBuf,

        /// Directory where page stubs are scaffolded
        #[arg(long, default_value = ".pagemedic/pages")]
        pages_root: PathBuf,

        /// Classify only; skip repair execution
        #[arg(long)]
        no_repair: bool,
    },

    /// Parse and validate a route manifest
    Validate {
        /// Path to the route manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Re-render Markdown from a stored report artifact
    Render {
        /// Directory containing report artifacts
        #[arg(long)]
        report_dir: PathBuf,

        /// Run ID of the stored report
        #[arg(long)]
        run: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            manifest,
            concurrency,
            timeout,
            base_url,
            auth_header,
            fixtures,
            out_dir,
            pages_root,
            no_repair,
        } => {
            let code = cmd_run(
                &manifest,
                concurrency,
                timeout,
                base_url.as_deref(),
                auth_header.as_deref(),
                fixtures.as_deref(),
                &out_dir,
                &pages_root,
                no_repair,
            )
            .await?;
            std::process::exit(code);
        }
        Commands::Validate { manifest } => cmd_validate(&manifest),
        Commands::Render {
            report_dir,
            run,
            output,
        } => cmd_render(&report_dir, &run, output.as_deref()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    manifest: &std::path::Path,
    concurrency: usize,
    timeout_ms: u64,
    base_url: Option<&str>,
    auth_header: Option<&str>,
    fixtures: Option<&std::path::Path>,
    out_dir: &std::path::Path,
    pages_root: &std::path::Path,
    no_repair: bool,
) -> Result<i32> {
    let targets = load_manifest(manifest)
        .with_context(|| format!("load manifest {}", manifest.display()))?;
    info!(targets = targets.len(), "manifest loaded");

    // Fixtures win over a live base URL.
    let factory: Arc<dyn DriverFactory> = match (fixtures, base_url) {
        (Some(path), _) => Arc::new(
            ReplayDriverFactory::from_file(path)
                .with_context(|| format!("load fixtures {}", path.display()))?,
        ),
        (None, Some(url)) => {
            let mut http = HttpDriverFactory::new(url);
            if let Some(header) = auth_header {
                http = http.with_auth_header(header).context("parse auth header")?;
            }
            Arc::new(http)
        }
        (None, None) => {
            anyhow::bail!("either --base-url or --fixtures is required");
        }
    };

    let registry = if no_repair {
        MethodRegistry::new()
    } else {
        let notes_dir = out_dir.join("notes");
        standard_registry(pages_root, notes_dir, base_url.unwrap_or_default())
    };

    let config = RunConfig {
        concurrency,
        probe_timeout: Duration::from_millis(timeout_ms),
        repair: !no_repair,
    };
    let orchestrator = Orchestrator::new(
        factory,
        StrategyTable::standard(),
        Arc::new(registry),
        config,
    );

    // First Ctrl-C flips the token: in-flight work finishes, the partial
    // report is still written.
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight work");
            let _ = cancel_tx.send(true);
        }
    });

    match orchestrator.run(targets, cancel_rx).await {
        Ok(report) => {
            emit_artifacts(out_dir, &report)?;
            print_summary(&report);
            if report.unrepaired_errors() == 0 {
                Ok(0)
            } else {
                Ok(1)
            }
        }
        Err(run_error) => {
            eprintln!("fatal driver error: {}", run_error.source);
            emit_artifacts(out_dir, &run_error.report)?;
            print_summary(&run_error.report);
            Ok(2)
        }
    }
}

fn emit_artifacts(out_dir: &std::path::Path, report: &Report) -> Result<()> {
    let json_path = write_report_json(out_dir, report).context("write report.json")?;
    let md_path = write_report_md(out_dir, report).context("write report.md")?;
    info!(
        json = %json_path.display(),
        markdown = %md_path.display(),
        "report artifacts written"
    );
    Ok(())
}

fn print_summary(report: &Report) {
    let s = &report.summary;
    println!("Run {}", report.run_id);
    println!(
        "  probed {} target(s): {} healthy, {} failing ({:.1}% success)",
        s.total,
        s.successful,
        s.failed,
        s.success_rate * 100.0
    );
    for (kind, count) in &s.by_kind {
        println!("  {kind}: {count}");
    }
    println!(
        "  repairs: {} attempted, {} completed, {} failed",
        s.repairs_attempted, s.repairs_completed, s.repairs_failed
    );
    let unrepaired = report.unrepaired_errors();
    if unrepaired > 0 {
        println!("  {unrepaired} error(s) remain unrepaired");
    }
}

fn cmd_validate(manifest: &std::path::Path) -> Result<()> {
    let targets = load_manifest(manifest)
        .with_context(|| format!("load manifest {}", manifest.display()))?;
    let categories: BTreeSet<&str> = targets.iter().map(|t| t.category.as_str()).collect();
    println!(
        "manifest ok: {} target(s) across {} categorie(s)",
        targets.len(),
        categories.len()
    );
    for category in categories {
        let count = targets.iter().filter(|t| t.category == category).count();
        println!("  {category}: {count}");
    }
    Ok(())
}

fn cmd_render(
    report_dir: &std::path::Path,
    run_id: &str,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let report = read_report_artifact(report_dir, run_id)
        .with_context(|| format!("read report '{run_id}' from {}", report_dir.display()))?;
    let markdown = render_markdown(&report);
    match output {
        Some(path) => {
            std::fs::write(path, markdown).with_context(|| format!("write {}", path.display()))?;
            println!("rendered {} to {}", run_id, path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_validate_accepts_and_rejects_manifests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("manifest.json");
        std::fs::write(
            &good,
            r#"{ "targets": [ { "path": "/home", "category": "portal" } ] }"#,
        )
        .expect("write manifest");
        assert!(cmd_validate(&good).is_ok());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{ "targets": [] }"#).expect("write manifest");
        assert!(cmd_validate(&bad).is_err());
    }

    #[test]
    fn test_render_writes_markdown_from_stored_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = Report::new("run-render", Utc::now());
        write_report_json(dir.path(), &report).expect("write artifact");

        let out = dir.path().join("out.md");
        cmd_render(dir.path(), "run-render", Some(&out)).expect("render");
        let markdown = std::fs::read_to_string(&out).expect("read rendered file");
        assert!(markdown.starts_with("# Pagemedic Report: run-render"));
    }

    #[tokio::test]
    async fn test_run_with_fixtures_selects_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().join("reports");
        let pages_root = dir.path().join("pages");

        let fixtures = dir.path().join("fixtures.json");
        let body = "all good here ".repeat(10);
        std::fs::write(
            &fixtures,
            format!(
                r#"{{ "pages": {{
                    "/ok": {{ "status": 200, "title": "OK", "body_text": "{body}" }},
                    "/missing": {{ "status": 404, "title": "404 Not Found" }}
                }} }}"#
            ),
        )
        .expect("write fixtures");

        let healthy = dir.path().join("healthy.json");
        std::fs::write(
            &healthy,
            r#"{ "targets": [ { "path": "/ok", "category": "portal" } ] }"#,
        )
        .expect("write manifest");
        let code = cmd_run(
            &healthy, 2, 1000, None, None,
            Some(&fixtures), &out_dir, &pages_root, true,
        )
        .await
        .expect("run");
        assert_eq!(code, 0);

        let failing = dir.path().join("failing.json");
        std::fs::write(
            &failing,
            r#"{ "targets": [ { "path": "/missing", "category": "portal" } ] }"#,
        )
        .expect("write manifest");
        let code = cmd_run(
            &failing, 2, 1000, None, None,
            Some(&fixtures), &out_dir, &pages_root, true,
        )
        .await
        .expect("run");
        assert_eq!(code, 1);

        // Both runs wrote verified artifacts.
        let runs: Vec<_> = std::fs::read_dir(&out_dir).expect("out dir").collect();
        assert_eq!(runs.len(), 2);
    }
}
