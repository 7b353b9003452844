//! Structured observability hooks for run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span constructor, [`run_span`]
//! - Emission functions for key lifecycle events: run start/finish, probe
//!   completion, classification, repair completion, cancellation
//!
//! Events are emitted at `info!` level with an `event = "..."` key so log
//! pipelines can filter on lifecycle stages.

use tracing::info;

/// Build the span every lifecycle event of a run lives under.
///
/// Attach it to the run future with `tracing::Instrument` so the span
/// follows the work across await points.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("pagemedic.run", run_id = %run_id)
}

/// Emit event: run started with target count.
pub fn emit_run_started(run_id: &str, targets: usize) {
    info!(event = "run.started", run_id = %run_id, targets = targets);
}

/// Emit event: one probe finished (timed-out probes report status 0).
pub fn emit_probe_finished(run_id: &str, target_id: &str, http_status: u16, load_time_ms: u64) {
    info!(
        event = "probe.finished",
        run_id = %run_id,
        target_id = %target_id,
        http_status = http_status,
        load_time_ms = load_time_ms,
    );
}

/// Emit event: classification produced `count` records for a target.
pub fn emit_errors_classified(run_id: &str, target_id: &str, count: usize) {
    info!(
        event = "classify.finished",
        run_id = %run_id,
        target_id = %target_id,
        count = count,
    );
}

/// Emit event: one repair task reached a terminal status.
pub fn emit_repair_finished(run_id: &str, task_id: &str, success: bool) {
    info!(
        event = "repair.finished",
        run_id = %run_id,
        task_id = %task_id,
        success = success,
    );
}

/// Emit event: cancellation observed; `completed` probes made it into the report.
pub fn emit_run_cancelled(run_id: &str, completed: usize) {
    info!(event = "run.cancelled", run_id = %run_id, completed = completed);
}

/// Emit event: run finished with duration and unrepaired error count.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, total: usize, unrepaired: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        total = total,
        unrepaired = unrepaired,
    );
}

/// Emit event: fatal driver failure aborted the run (warning level).
pub fn emit_run_aborted(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run.aborted", run_id = %run_id, error = %error);
}
