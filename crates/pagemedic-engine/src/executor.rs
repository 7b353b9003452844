//! Repair execution: fallback chains over named repair methods.
//!
//! Each task walks its strategy's methods in declared order until one
//! succeeds or the chain is exhausted. Methods are opaque side-effecting
//! collaborators; the executor only observes their [`MethodOutcome`].
//! Methods within one task never run concurrently; independent task
//! groups may (see the orchestrator).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use pagemedic_core::domain::{MethodOutcome, RepairResult, RepairTask, TaskStatus};
use pagemedic_core::planner::TaskGroup;

/// One remediation attempt for a class of failure.
///
/// Implementations catch their own failures and fold them into
/// `success = false` outcomes; `attempt` never errors.
#[async_trait]
pub trait RepairMethod: Send + Sync {
    /// Registry name, referenced by strategies.
    fn name(&self) -> &str;

    /// Try to remediate the task's failure.
    async fn attempt(&self, task: &RepairTask) -> MethodOutcome;
}

/// Name -> method lookup used to resolve strategy method lists.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn RepairMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Arc<dyn RepairMethod>) {
        self.methods.insert(method.name().to_string(), method);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RepairMethod>> {
        self.methods.get(name)
    }
}

/// Drive one task through its method chain to a terminal status.
///
/// The first successful method completes the task with its action; when
/// every method fails (or none is configured) the task fails with the
/// last collected reason. Never retried within a run. A method name
/// missing from the registry counts as a failed attempt and the chain
/// continues.
pub async fn execute(mut task: RepairTask, registry: &MethodRegistry) -> RepairResult {
    task.status = TaskStatus::Running;
    let mut last_reason = format!(
        "no repair methods configured for {}",
        task.record.kind
    );

    for name in task.strategy.methods.clone() {
        let outcome = match registry.get(&name) {
            Some(method) => method.attempt(&task).await,
            None => MethodOutcome::failure(format!("unknown repair method '{name}'")),
        };
        debug!(
            task_id = %task.id,
            method = %name,
            success = outcome.success,
            "repair method attempted"
        );

        if outcome.success {
            task.status = TaskStatus::Completed;
            return RepairResult {
                task,
                success: true,
                action: outcome.action,
                reason: None,
            };
        }
        last_reason = outcome
            .reason
            .unwrap_or_else(|| format!("method '{name}' failed without a reason"));
    }

    task.status = TaskStatus::Failed;
    RepairResult {
        task,
        success: false,
        action: None,
        reason: Some(last_reason),
    }
}

/// Execute a group's tasks serially, checking the cancellation token
/// before each task. Cancelled tasks are not started and produce no
/// result.
pub async fn execute_group(
    group: TaskGroup,
    registry: &MethodRegistry,
    cancel: &watch::Receiver<bool>,
) -> Vec<RepairResult> {
    let mut results = Vec::with_capacity(group.tasks.len());
    for task in group.tasks {
        if *cancel.borrow() {
            break;
        }
        results.push(execute(task, registry).await);
    }
    results
}
