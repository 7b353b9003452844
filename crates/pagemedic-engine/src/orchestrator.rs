//! The pipeline driver: manifest -> probe -> classify -> plan -> execute
//! -> report.
//!
//! Probes run on a bounded worker pool; classification is inline; planning
//! is a barrier; repairs run one task group at a time per resource key,
//! with distinct groups concurrent. A single watch-channel cancellation
//! token stops new work while letting in-flight work finish, and a fatal
//! driver error flushes whatever partial report exists before surfacing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{warn, Instrument};
use uuid::Uuid;

use pagemedic_core::classifier::classify;
use pagemedic_core::domain::{ErrorRecord, PageTarget, ProbeResult, RepairResult};
use pagemedic_core::obs;
use pagemedic_core::planner::{group_tasks, plan, StrategyTable};
use pagemedic_core::report::Report;

use crate::driver::{DriverError, DriverFactory};
use crate::executor::{execute_group, MethodRegistry};
use crate::prober;

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum concurrent probes (one browser context each).
    pub concurrency: usize,
    /// Independent timeout per probe.
    pub probe_timeout: Duration,
    /// When false, classification still runs but no repairs execute.
    pub repair: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            probe_timeout: Duration::from_secs(10),
            repair: true,
        }
    }
}

/// A run aborted by a fatal driver failure. The partial report collected
/// up to that point is still valid and should be emitted by the caller.
#[derive(Debug)]
pub struct RunError {
    pub report: Report,
    pub source: DriverError,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run aborted: {}", self.source)
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Drives the probe-classify-plan-execute pipeline over a route manifest.
pub struct Orchestrator {
    factory: Arc<dyn DriverFactory>,
    strategies: StrategyTable,
    registry: Arc<MethodRegistry>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn DriverFactory>,
        strategies: StrategyTable,
        registry: Arc<MethodRegistry>,
        config: RunConfig,
    ) -> Self {
        Self {
            factory,
            strategies,
            registry,
            config,
        }
    }

    /// Execute one full run over `targets`.
    ///
    /// Flipping `cancel` stops new probes and repair tasks from starting;
    /// in-flight work finishes and the smaller report is still returned.
    /// Only a fatal [`DriverError`] yields `Err`, carrying the partial
    /// report.
    pub async fn run(
        &self,
        targets: Vec<PageTarget>,
        cancel: watch::Receiver<bool>,
    ) -> Result<Report, RunError> {
        let run_id = format!("run-{}", Uuid::new_v4());
        let span = obs::run_span(&run_id);
        self.run_inner(run_id, targets, cancel).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: String,
        targets: Vec<PageTarget>,
        cancel: watch::Receiver<bool>,
    ) -> Result<Report, RunError> {
        let started = Instant::now();
        let mut report = Report::new(run_id.clone(), Utc::now());
        obs::emit_run_started(&run_id, targets.len());

        let (slots, fatal) = self.probe_all(&run_id, &targets, &cancel).await;

        // Classification is pure; run it inline in manifest order so the
        // report lists targets the way the manifest declares them.
        let mut records: Vec<ErrorRecord> = Vec::new();
        for probe in slots.into_iter().flatten() {
            let probe_records = classify(&probe);
            obs::emit_errors_classified(&run_id, &probe.target.id, probe_records.len());
            report.add_probe(probe);
            for record in probe_records {
                report.add_error(record.clone());
                records.push(record);
            }
        }

        if let Some(source) = fatal {
            obs::emit_run_aborted(&run_id, &source);
            return Err(RunError { report, source });
        }

        if *cancel.borrow() {
            obs::emit_run_cancelled(&run_id, report.summary.total);
        }

        // Planning is the barrier: the severity sort needs every record.
        let tasks = plan(records, &self.strategies);
        let groups = group_tasks(tasks);

        if self.config.repair && !groups.is_empty() {
            let group_count = groups.len();
            let mut join_set = JoinSet::new();
            for (gidx, group) in groups.into_iter().enumerate() {
                let registry = Arc::clone(&self.registry);
                let cancel = cancel.clone();
                join_set.spawn(async move {
                    let results = execute_group(group, &registry, &cancel).await;
                    (gidx, results)
                });
            }

            let mut ordered: Vec<Vec<RepairResult>> = (0..group_count).map(|_| Vec::new()).collect();
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((gidx, results)) => ordered[gidx] = results,
                    Err(e) => warn!(error = %e, "repair group task join error"),
                }
            }
            for result in ordered.into_iter().flatten() {
                obs::emit_repair_finished(&run_id, &result.task.id.to_string(), result.success);
                report.add_repair(result);
            }
        }

        obs::emit_run_finished(
            &run_id,
            started.elapsed().as_millis() as u64,
            report.summary.total,
            report.unrepaired_errors(),
        );
        Ok(report)
    }

    /// Probe every target on the bounded pool. Returns per-manifest-index
    /// result slots (None for skipped targets) plus the first fatal driver
    /// error, if any.
    async fn probe_all(
        &self,
        run_id: &str,
        targets: &[PageTarget],
        cancel: &watch::Receiver<bool>,
    ) -> (Vec<Option<ProbeResult>>, Option<DriverError>) {
        let sem = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        // Fatal failures fail-fast through the same mechanics as
        // cancellation: siblings stop starting, in-flight probes finish.
        let (fatal_tx, _) = watch::channel(false);
        let fatal_tx = Arc::new(fatal_tx);

        let mut join_set = JoinSet::new();
        for (idx, target) in targets.iter().cloned().enumerate() {
            let factory = Arc::clone(&self.factory);
            let sem = Arc::clone(&sem);
            let cancel = cancel.clone();
            let fatal_tx = Arc::clone(&fatal_tx);
            let fatal_rx = fatal_tx.subscribe();
            let timeout = self.config.probe_timeout;
            let run_id = run_id.to_string();

            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                if *cancel.borrow() || *fatal_rx.borrow() {
                    return (idx, Ok(None));
                }
                // One browser context per concurrent probe; sharing one
                // would let interleaved probes read each other's page.
                let driver = match factory.session().await {
                    Ok(driver) => driver,
                    Err(e) => {
                        let _ = fatal_tx.send(true);
                        return (idx, Err(e));
                    }
                };
                match prober::probe(&target, driver.as_ref(), timeout).await {
                    Ok(result) => {
                        obs::emit_probe_finished(
                            &run_id,
                            &result.target.id,
                            result.http_status,
                            result.load_time_ms,
                        );
                        (idx, Ok(Some(result)))
                    }
                    Err(e) => {
                        let _ = fatal_tx.send(true);
                        (idx, Err(e))
                    }
                }
            });
        }

        let mut slots: Vec<Option<ProbeResult>> = (0..targets.len()).map(|_| None).collect();
        let mut fatal: Option<DriverError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(result))) => slots[idx] = result,
                Ok((_, Err(e))) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
                Err(e) => {
                    if fatal.is_none() {
                        fatal = Some(DriverError::Session(format!("probe task join error: {e}")));
                    }
                }
            }
        }
        (slots, fatal)
    }
}
