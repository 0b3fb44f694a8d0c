//! Structured outcome of a scheduler run.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::error::SchedulerError;
use super::plan::GroupKey;
use super::task::{SortKey, TaskId};

/// Why a registered task never ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The run aborted after a failure before this task was launched.
    Aborted,
    /// The task's group was still waiting on other groups when the run ended.
    Blocked,
}

/// Final status of a task in the scheduler lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task finished successfully.
    Completed,
    /// Task failed with a reason.
    Failed(String),
    /// Task was never launched.
    Skipped(SkipReason),
}

/// What happened to one registered task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    /// Id returned at registration.
    pub id: TaskId,
    /// Group the task belonged to.
    pub group: GroupKey,
    /// Sort key the task was launched by.
    pub sort_key: SortKey,
    /// Final status.
    pub status: TaskStatus,
}

/// Report returned by [`Scheduler::execute`](super::Scheduler::execute).
///
/// Settled tasks appear in settlement order, followed by tasks that never ran.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Identifier correlating this run's log lines and audit events.
    pub run_id: Uuid,
    /// One entry per registered task.
    pub outcomes: Vec<TaskOutcome>,
    /// Whether the run stopped launching work because of a failure.
    pub aborted: bool,
    /// Wall time from first launch to the last settlement.
    pub elapsed: Duration,
}

impl ExecutionReport {
    /// Outcomes of tasks that failed.
    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TaskStatus::Failed(_)))
    }

    /// Outcomes of tasks that never ran.
    pub fn skipped(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TaskStatus::Skipped(_)))
    }

    /// Outcomes of tasks whose group was still waiting on other groups when
    /// the run ended, typically because of a dependency cycle.
    pub fn blocked(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Skipped(SkipReason::Blocked))
    }

    /// Number of tasks that completed successfully.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Completed)
            .count()
    }

    /// Outcome for a task id.
    #[must_use]
    pub fn outcome(&self, id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Whether every registered task completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.completed_count() == self.outcomes.len()
    }

    /// Convert failures into an error, for callers that want the run to fail
    /// once after everything settled.
    ///
    /// Tasks skipped because the run aborted are covered by the failure that
    /// caused the abort. Tasks stranded behind unreleased groups are not, so
    /// they are reported too.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::TasksFailed`] if any task failed, otherwise
    /// [`SchedulerError::TasksBlocked`] if any task was never released.
    pub fn into_result(self) -> Result<Self, SchedulerError> {
        let total = self.outcomes.len();
        let failed = self.failures().count();
        if failed > 0 {
            return Err(SchedulerError::TasksFailed { failed, total });
        }
        let blocked = self.blocked().count();
        if blocked > 0 {
            return Err(SchedulerError::TasksBlocked { blocked, total });
        }
        Ok(self)
    }
}
