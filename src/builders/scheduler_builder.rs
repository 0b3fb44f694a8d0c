//! Builder that turns registered tasks and a dependency table into a plan.

use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::core::graph::{CategoryDependencies, CategoryGraph};
use crate::core::plan::{ExecutionGroup, ExecutionPlan, GroupKey, PendingTask};
use crate::core::{Scheduler, SchedulerError, SortKey, Task, TaskId, TaskParams};

/// Collects tasks for one run and resolves their dependency order.
///
/// Groups whose category depends on other categories start immediately; the
/// groups they depend on wait until every dependent group in the same
/// partition has drained. This deletes a referencing resource before the
/// resource it references.
///
/// ```rust
/// use std::collections::HashMap;
/// use env_reaper::core::{GroupKey, SchedulerBuilder, TaskParams};
///
/// let deps = HashMap::from([("db".to_string(), vec!["subnet".to_string()])]);
/// let mut builder = SchedulerBuilder::new(deps);
/// builder.add_task(|| async { Ok(()) }, TaskParams::new().partition("env1").category("db"));
/// builder.add_task(|| async { Ok(()) }, TaskParams::new().partition("env1").category("subnet"));
///
/// let scheduler = builder.build().unwrap();
/// assert_eq!(scheduler.initial_groups(), vec![GroupKey::new(Some("env1"), Some("db"))]);
/// ```
#[derive(Default)]
pub struct SchedulerBuilder {
    dependencies: CategoryDependencies,
    groups: Vec<ExecutionGroup>,
    lookup: HashMap<GroupKey, usize>,
    task_count: u64,
    detect_cycles: bool,
}

impl SchedulerBuilder {
    /// Create a builder for the given category dependency table.
    #[must_use]
    pub fn new(dependencies: CategoryDependencies) -> Self {
        Self {
            dependencies,
            ..Self::default()
        }
    }

    /// Create a builder using the dependency table from configuration.
    #[must_use]
    pub fn from_config(cfg: &SchedulerConfig) -> Self {
        Self::new(cfg.dependencies.clone())
    }

    /// Reject cyclic dependency tables at build time instead of leaving the
    /// affected groups blocked forever.
    #[must_use]
    pub const fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    /// Register a task. Returns the id used for it in the execution report.
    pub fn add_task<T: Task>(&mut self, task: T, params: TaskParams) -> TaskId {
        self.task_count += 1;
        let id = self.task_count;
        let TaskParams {
            partition,
            category,
            sort_key,
        } = params;
        let sort_key = sort_key.unwrap_or_else(|| {
            SortKey::Number(i64::try_from(id).unwrap_or(i64::MAX))
        });

        let key = GroupKey {
            partition,
            category,
        };
        let idx = match self.lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.groups.push(ExecutionGroup::new(key.clone()));
                self.lookup.insert(key, idx);
                idx
            }
        };
        self.groups[idx].pending.push_back(PendingTask {
            id,
            sort_key,
            task: Box::new(task),
        });
        id
    }

    /// Number of tasks registered so far.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.groups.iter().map(|g| g.pending.len()).sum()
    }

    /// Resolve the plan and produce a one-shot [`Scheduler`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DependencyCycle`] only when cycle detection
    /// is enabled and the dependency table contains a cycle.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let graph = CategoryGraph::new(&self.dependencies);
        if self.detect_cycles {
            if let Some(path) = graph.find_cycle() {
                return Err(SchedulerError::DependencyCycle(path));
            }
        }

        let Self {
            mut groups, lookup, ..
        } = self;

        for group in &mut groups {
            group
                .pending
                .make_contiguous()
                .sort_by(|a, b| a.sort_key.compare(&b.sort_key));
        }

        for idx in 0..groups.len() {
            let Some(category) = groups[idx].key.category.as_deref() else {
                continue;
            };
            let Some(cat_idx) = graph.index_of(category) else {
                continue;
            };
            let partition = groups[idx].key.partition.clone();

            for dep in graph.closure(cat_idx) {
                let dep_key = GroupKey {
                    partition: partition.clone(),
                    category: Some(graph.name(dep).to_string()),
                };
                if let Some(&dep_idx) = lookup.get(&dep_key) {
                    groups[dep_idx].waiting_on.insert(idx);
                    groups[idx].notify.push(dep_idx);
                }
            }

            if !groups[idx].notify.is_empty() {
                tracing::debug!(
                    group = %groups[idx].key,
                    notify = ?groups[idx]
                        .notify
                        .iter()
                        .map(|&n| groups[n].key.to_string())
                        .collect::<Vec<_>>(),
                    "added to dependent groups"
                );
            }
        }

        let mut frontier: Vec<usize> = (0..groups.len())
            .filter(|&idx| groups[idx].waiting_on.is_empty())
            .collect();
        frontier.sort_by(|&a, &b| groups[a].key.cmp(&groups[b].key));

        tracing::debug!(
            initial_groups = ?frontier
                .iter()
                .map(|&idx| groups[idx].key.to_string())
                .collect::<Vec<_>>(),
            "built initial groups"
        );

        let task_count = groups.iter().map(|g| g.pending.len()).sum();
        Ok(Scheduler::new(ExecutionPlan {
            groups,
            lookup,
            frontier,
            task_count,
        }))
    }
}
