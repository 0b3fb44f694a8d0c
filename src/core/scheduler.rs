//! One-shot dependency-aware executor.
//!
//! The coordinating future owns the group arena and the run state. Tasks are
//! spawned onto the runtime and report back over a channel, so every mutation
//! of running counts, wait sets and the abort flag happens in one place.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::error::SchedulerError;
use super::plan::{ExecutionGroup, ExecutionPlan, GroupKey, PendingTask};
use super::report::{ExecutionReport, SkipReason, TaskOutcome, TaskStatus};
use super::task::{SortKey, TaskId, TaskResult};
use crate::config::ExecuteOptions;
use crate::runtime::{Spawn, TokioSpawner};

/// Executes a plan produced by
/// [`SchedulerBuilder::build`](crate::builders::SchedulerBuilder::build).
///
/// A scheduler runs once; [`execute`](Self::execute) consumes it.
pub struct Scheduler {
    plan: ExecutionPlan,
    audit: Option<Box<dyn AuditSink>>,
}

impl Scheduler {
    pub(crate) fn new(plan: ExecutionPlan) -> Self {
        Self { plan, audit: None }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Groups that may start as soon as the run begins, in launch order.
    #[must_use]
    pub fn initial_groups(&self) -> Vec<GroupKey> {
        self.plan
            .frontier
            .iter()
            .map(|&idx| self.plan.groups[idx].key.clone())
            .collect()
    }

    /// Groups that must drain before `key` may start, or `None` if the run
    /// has no such group.
    #[must_use]
    pub fn waiting_on(&self, key: &GroupKey) -> Option<Vec<GroupKey>> {
        self.plan
            .group(key)
            .map(|g| self.sorted_keys(g.waiting_on.iter().copied()))
    }

    /// Groups released when `key` drains, or `None` if the run has no such
    /// group.
    #[must_use]
    pub fn notify_targets(&self, key: &GroupKey) -> Option<Vec<GroupKey>> {
        self.plan
            .group(key)
            .map(|g| self.sorted_keys(g.notify.iter().copied()))
    }

    /// Number of registered tasks.
    #[must_use]
    pub const fn task_count(&self) -> usize {
        self.plan.task_count
    }

    /// Number of `(partition, category)` groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.plan.groups.len()
    }

    fn sorted_keys(&self, indices: impl Iterator<Item = usize>) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = indices
            .map(|idx| self.plan.groups[idx].key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Run every task on the current tokio runtime.
    ///
    /// Task failures never surface as `Err`; they are listed in the returned
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidOptions`] for a zero concurrency bound
    /// and [`SchedulerError::Runtime`] when called outside a tokio runtime.
    pub async fn execute(self, options: ExecuteOptions) -> Result<ExecutionReport, SchedulerError> {
        let spawner = TokioSpawner::current()?;
        self.execute_with(&spawner, options).await
    }

    /// Run every task, launching them through `spawner`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with<S: Spawn>(
        self,
        spawner: &S,
        options: ExecuteOptions,
    ) -> Result<ExecutionReport, SchedulerError> {
        options.validate().map_err(SchedulerError::InvalidOptions)?;
        Run::new(self, options).drive(spawner).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Aborting,
    Drained,
}

struct Settlement {
    group: usize,
    id: TaskId,
    sort_key: SortKey,
    result: TaskResult,
}

/// Reports a task's settlement exactly once. If the spawned future is dropped
/// before the task finishes (runtime shutdown, a spawner that discards work),
/// the drop reports a failure so the coordinator never waits on it forever.
struct SettlementGuard {
    tx: mpsc::UnboundedSender<Settlement>,
    pending: Option<(usize, TaskId, SortKey)>,
}

impl SettlementGuard {
    fn settle(mut self, result: TaskResult) {
        self.send(result);
    }

    fn send(&mut self, result: TaskResult) {
        if let Some((group, id, sort_key)) = self.pending.take() {
            // The receiver only goes away once the run has returned.
            let _ = self.tx.send(Settlement {
                group,
                id,
                sort_key,
                result,
            });
        }
    }
}

impl Drop for SettlementGuard {
    fn drop(&mut self) {
        self.send(Err(anyhow::anyhow!("task dropped before completion")));
    }
}

struct Run {
    run_id: Uuid,
    groups: Vec<ExecutionGroup>,
    runnable: VecDeque<usize>,
    /// Group whose pending tasks are being launched.
    current: Option<usize>,
    in_flight: usize,
    state: RunState,
    options: ExecuteOptions,
    outcomes: Vec<TaskOutcome>,
    audit: Option<Box<dyn AuditSink>>,
}

impl Run {
    fn new(scheduler: Scheduler, options: ExecuteOptions) -> Self {
        let Scheduler { plan, audit } = scheduler;
        let mut run = Self {
            run_id: Uuid::new_v4(),
            groups: plan.groups,
            runnable: VecDeque::new(),
            current: None,
            in_flight: 0,
            state: RunState::Running,
            options,
            outcomes: Vec::with_capacity(plan.task_count),
            audit,
        };
        for idx in plan.frontier {
            run.enqueue(idx);
        }
        run
    }

    async fn drive<S: Spawn>(mut self, spawner: &S) -> Result<ExecutionReport, SchedulerError> {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement>();

        tracing::info!(
            run_id = %self.run_id,
            groups = self.groups.len(),
            maximum_concurrency = self.options.maximum_concurrency,
            continue_after_errors = self.options.continue_after_errors,
            "starting scheduler run"
        );

        loop {
            self.launch_ready(spawner, &tx);
            if self.in_flight == 0 {
                break;
            }
            let Some(settlement) = rx.recv().await else {
                return Err(SchedulerError::Backend("completion channel closed".into()));
            };
            self.settle(settlement);
        }

        let aborted = self.state == RunState::Aborting;
        self.state = RunState::Drained;
        self.record_skipped(aborted);

        let report = ExecutionReport {
            run_id: self.run_id,
            outcomes: self.outcomes,
            aborted,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            run_id = %report.run_id,
            completed = report.completed_count(),
            failed = report.failures().count(),
            skipped = report.skipped().count(),
            aborted,
            elapsed_ms = report.elapsed.as_millis(),
            "scheduler run finished"
        );
        Ok(report)
    }

    /// Launch tasks until the concurrency bound is hit or nothing is runnable.
    fn launch_ready<S: Spawn>(&mut self, spawner: &S, tx: &mpsc::UnboundedSender<Settlement>) {
        while self.state == RunState::Running && self.in_flight < self.options.maximum_concurrency {
            let idx = match self.current {
                Some(idx) if !self.groups[idx].pending.is_empty() => idx,
                _ => {
                    let Some(idx) = self.runnable.pop_front() else {
                        self.current = None;
                        return;
                    };
                    tracing::debug!(group = %self.groups[idx].key, "starting group");
                    self.current = Some(idx);
                    idx
                }
            };
            let Some(PendingTask { id, sort_key, task }) = self.groups[idx].pending.pop_front()
            else {
                continue;
            };

            self.groups[idx].running += 1;
            self.in_flight += 1;
            self.audit(idx, Some(id), AuditAction::TaskStarted, None);

            let guard = SettlementGuard {
                tx: tx.clone(),
                pending: Some((idx, id, sort_key)),
            };
            spawner.spawn(async move {
                let result = match AssertUnwindSafe(task.run()).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(anyhow::anyhow!("task panicked: {}", panic_message(&*panic))),
                };
                guard.settle(result);
            });
        }
    }

    fn settle(&mut self, settlement: Settlement) {
        let Settlement {
            group: idx,
            id,
            sort_key,
            result,
        } = settlement;
        self.in_flight -= 1;
        self.groups[idx].running -= 1;

        let status = match result {
            Ok(()) => {
                self.audit(idx, Some(id), AuditAction::TaskCompleted, None);
                TaskStatus::Completed
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(
                    run_id = %self.run_id,
                    group = %self.groups[idx].key,
                    task_id = id,
                    error = %message,
                    "task failed"
                );
                self.audit(idx, Some(id), AuditAction::TaskFailed, Some(message.clone()));
                if !self.options.continue_after_errors && self.state == RunState::Running {
                    self.state = RunState::Aborting;
                    tracing::warn!(
                        run_id = %self.run_id,
                        in_flight = self.in_flight,
                        "aborting run, waiting for in-flight tasks"
                    );
                    self.audit(idx, Some(id), AuditAction::RunAborted, None);
                }
                TaskStatus::Failed(message)
            }
        };
        self.outcomes.push(TaskOutcome {
            id,
            group: self.groups[idx].key.clone(),
            sort_key,
            status,
        });

        if self.state == RunState::Running && self.groups[idx].is_drained() {
            self.notify_completion(idx);
        }
    }

    fn notify_completion(&mut self, idx: usize) {
        self.audit(idx, None, AuditAction::GroupDrained, None);
        for n in 0..self.groups[idx].notify.len() {
            let target = self.groups[idx].notify[n];
            let released = {
                let waiting = &mut self.groups[target].waiting_on;
                waiting.remove(&idx) && waiting.is_empty()
            };
            tracing::debug!(
                group = %self.groups[idx].key,
                target = %self.groups[target].key,
                queued = released,
                "notifying group of completion"
            );
            if released {
                self.audit(target, None, AuditAction::GroupUnblocked, None);
                self.enqueue(target);
            }
        }
    }

    fn enqueue(&mut self, idx: usize) {
        self.audit(idx, None, AuditAction::GroupQueued, None);
        self.runnable.push_back(idx);
    }

    fn record_skipped(&mut self, aborted: bool) {
        let reason = if aborted {
            SkipReason::Aborted
        } else {
            SkipReason::Blocked
        };
        for group in &mut self.groups {
            if !group.pending.is_empty() && reason == SkipReason::Blocked {
                tracing::warn!(
                    group = %group.key,
                    tasks = group.pending.len(),
                    "group never became runnable"
                );
            }
            for pending in group.pending.drain(..) {
                self.outcomes.push(TaskOutcome {
                    id: pending.id,
                    group: group.key.clone(),
                    sort_key: pending.sort_key,
                    status: TaskStatus::Skipped(reason),
                });
            }
        }
    }

    fn audit(&self, idx: usize, task_id: Option<TaskId>, action: AuditAction, payload: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(
                self.run_id,
                self.groups[idx].key.to_string(),
                task_id,
                action,
                payload,
            ));
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
