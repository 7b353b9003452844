//! Repair planning: strategy lookup, severity ordering, resource grouping.
//!
//! Planning is the synchronization barrier between classification and
//! execution: the global severity sort needs every record before any
//! repair starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ErrorKind, ErrorRecord, RepairStrategy, RepairTask};

/// Static `ErrorKind -> RepairStrategy` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTable {
    strategies: BTreeMap<ErrorKind, RepairStrategy>,
}

impl StrategyTable {
    /// Table with no strategies: every task plans as unrepairable.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// The standard advisory catalogue. `Other` deliberately has no entry.
    pub fn standard() -> Self {
        Self::empty()
            .with_strategy(RepairStrategy::new(
                ErrorKind::NotFound,
                ["stub_page_scaffold", "advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::ServerError,
                ["endpoint_recheck", "advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::PermissionDenied,
                ["advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::ComponentMissing,
                ["stub_page_scaffold", "advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::ConsoleError,
                ["advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::NetworkError,
                ["endpoint_recheck", "advisory_note"],
            ))
            .with_strategy(RepairStrategy::new(
                ErrorKind::BlankContent,
                ["advisory_note"],
            ))
    }

    /// Insert or replace the strategy for its kind.
    pub fn with_strategy(mut self, strategy: RepairStrategy) -> Self {
        self.strategies.insert(strategy.kind, strategy);
        self
    }

    pub fn get(&self, kind: ErrorKind) -> Option<&RepairStrategy> {
        self.strategies.get(&kind)
    }
}

/// Build the global repair plan from classified records.
///
/// Every record becomes exactly one task; kinds without a configured
/// strategy get an empty-methods strategy so they surface as unrepairable
/// rather than being dropped. Tasks come out in ascending severity with
/// ties preserving input order.
pub fn plan(records: Vec<ErrorRecord>, table: &StrategyTable) -> Vec<RepairTask> {
    let mut tasks: Vec<RepairTask> = records
        .into_iter()
        .map(|record| {
            let strategy = table
                .get(record.kind)
                .cloned()
                .unwrap_or_else(|| RepairStrategy::unrepairable(record.kind));
            RepairTask::new(record, strategy)
        })
        .collect();

    // Vec::sort_by_key is stable, which is what keeps ties in input order.
    tasks.sort_by_key(|t| t.record.severity);
    tasks
}

/// Tasks sharing a resource key; members must execute serially.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    /// Derived from the target's category; tasks in the same category may
    /// write to the same external artifact.
    pub resource_key: String,
    pub tasks: Vec<RepairTask>,
}

/// Partition planned tasks by resource key.
///
/// Groups appear in order of first occurrence; each group keeps the global
/// severity order of its members. Distinct groups are safe to execute
/// concurrently.
pub fn group_tasks(tasks: Vec<RepairTask>) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = Vec::new();
    for task in tasks {
        let key = task.record.target.category.clone();
        match groups.iter_mut().find(|g| g.resource_key == key) {
            Some(group) => group.tasks.push(task),
            None => groups.push(TaskGroup {
                resource_key: key,
                tasks: vec![task],
            }),
        }
    }
    groups
}
