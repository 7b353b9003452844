//! Repair strategies, tasks, and outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::record::{ErrorKind, ErrorRecord};

/// Static repair configuration for one [`ErrorKind`].
///
/// `methods` holds repair-method names in strict fallback order; names are
/// resolved against a method registry at execution time, keeping the
/// strategy table (and the report artifact) serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStrategy {
    pub kind: ErrorKind,
    pub priority: u8,
    pub methods: Vec<String>,
}

impl RepairStrategy {
    pub fn new<I, S>(kind: ErrorKind, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            priority: kind.severity(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    /// A strategy with no methods: the task will surface in the report as
    /// unrepairable instead of being dropped.
    pub fn unrepairable(kind: ErrorKind) -> Self {
        Self {
            kind,
            priority: kind.severity(),
            methods: Vec::new(),
        }
    }
}

/// Lifecycle of a repair task: `pending -> running -> {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One planned repair, created by the planner and driven to a terminal
/// status by the executor. Never deleted, only appended to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairTask {
    pub id: Uuid,
    pub record: ErrorRecord,
    pub strategy: RepairStrategy,
    pub status: TaskStatus,
}

impl RepairTask {
    pub fn new(record: ErrorRecord, strategy: RepairStrategy) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            strategy,
            status: TaskStatus::Pending,
        }
    }
}

/// Result of one repair-method attempt.
///
/// Methods fold their own failures into `success = false`; an attempt never
/// surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodOutcome {
    pub success: bool,
    pub action: Option<String>,
    pub reason: Option<String>,
}

impl MethodOutcome {
    pub fn success(action: impl Into<String>) -> Self {
        Self {
            success: true,
            action: Some(action.into()),
            reason: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            action: None,
            reason: Some(reason.into()),
        }
    }
}

/// Terminal outcome of one repair task, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairResult {
    pub task: RepairTask,
    pub success: bool,
    /// Action taken by the succeeding method.
    pub action: Option<String>,
    /// Last failure reason when the method chain was exhausted.
    pub reason: Option<String>,
}
