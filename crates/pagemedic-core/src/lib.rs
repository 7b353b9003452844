//! Pagemedic Core Library
//!
//! Pure domain logic for the page regression and repair-advisory engine:
//! data model, error classification, repair planning, report aggregation,
//! artifact persistence, and observability hooks.

pub mod classifier;
pub mod domain;
pub mod manifest;
pub mod obs;
pub mod planner;
pub mod report;
pub mod reporting;
pub mod telemetry;

pub use domain::{
    ConsoleLevel, ConsoleMessage, CoreError, CoreResult, ErrorKind, ErrorRecord, MethodOutcome,
    NetworkFailure, PageTarget, ProbeResult, RepairResult, RepairStrategy, RepairTask, TaskStatus,
    BLANK_TEXT_THRESHOLD, BODY_EXCERPT_MAX,
};

pub use classifier::classify;
pub use manifest::{load_manifest, parse_manifest};
pub use planner::{group_tasks, plan, StrategyTable, TaskGroup};
pub use report::{Report, ReportSummary};
pub use reporting::{
    read_report_artifact, render_markdown, write_report_json, write_report_md,
};
pub use telemetry::init_tracing;
