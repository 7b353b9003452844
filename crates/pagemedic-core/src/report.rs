//! Additive report aggregation.
//!
//! One [`Report`] per run, owned by the orchestrator. Items are only ever
//! appended, and the summary is recomputed on every append, so a partial
//! report is valid at any point. `started_at` is the single timestamp in
//! the serialized artifact; re-serializing an unchanged report is
//! byte-identical.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ErrorRecord, ProbeResult, RepairResult};

/// Computed aggregates over the report's lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportSummary {
    /// Number of probes recorded.
    pub total: usize,
    /// Probes whose target produced zero error records.
    pub successful: usize,
    pub failed: usize,
    /// Error histogram keyed by kind name, stable-ordered.
    pub by_kind: BTreeMap<String, usize>,
    /// `successful / total`, `0.0` when no probes were recorded.
    pub success_rate: f32,
    pub repairs_attempted: usize,
    pub repairs_completed: usize,
    pub repairs_failed: usize,
}

/// The write-once artifact of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub probes: Vec<ProbeResult>,
    pub errors: Vec<ErrorRecord>,
    pub repairs: Vec<RepairResult>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            probes: Vec::new(),
            errors: Vec::new(),
            repairs: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    pub fn add_probe(&mut self, probe: ProbeResult) {
        self.probes.push(probe);
        self.recompute_summary();
    }

    pub fn add_error(&mut self, error: ErrorRecord) {
        self.errors.push(error);
        self.recompute_summary();
    }

    pub fn add_repair(&mut self, repair: RepairResult) {
        self.repairs.push(repair);
        self.recompute_summary();
    }

    /// Errors with no successful repair covering the same target and kind.
    /// Drives the CLI exit code.
    pub fn unrepaired_errors(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| {
                !self.repairs.iter().any(|r| {
                    r.success
                        && r.task.record.target.id == e.target.id
                        && r.task.record.kind == e.kind
                })
            })
            .count()
    }

    fn recompute_summary(&mut self) {
        let failing_targets: BTreeSet<&str> =
            self.errors.iter().map(|e| e.target.id.as_str()).collect();

        let total = self.probes.len();
        let successful = self
            .probes
            .iter()
            .filter(|p| !failing_targets.contains(p.target.id.as_str()))
            .count();

        let mut by_kind = BTreeMap::new();
        for error in &self.errors {
            *by_kind.entry(error.kind.as_str().to_string()).or_insert(0) += 1;
        }

        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f32 / total as f32
        };

        self.summary = ReportSummary {
            total,
            successful,
            failed: total - successful,
            by_kind,
            success_rate,
            repairs_attempted: self.repairs.len(),
            repairs_completed: self.repairs.iter().filter(|r| r.success).count(),
            repairs_failed: self.repairs.iter().filter(|r| !r.success).count(),
        };
    }
}
