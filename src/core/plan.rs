//! Execution plan: the group arena and its wait/notify edges.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use super::compare::compare_numeric_str;
use super::task::{SortKey, Task, TaskId};

/// Identity of a group: one `(partition, category)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    /// Partition, e.g. an environment name.
    pub partition: Option<String>,
    /// Category, e.g. a resource type.
    pub category: Option<String>,
}

impl GroupKey {
    /// Build a key from borrowed parts.
    #[must_use]
    pub fn new(partition: Option<&str>, category: Option<&str>) -> Self {
        Self {
            partition: partition.map(str::to_string),
            category: category.map(str::to_string),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.partition, &self.category) {
            (Some(p), Some(c)) => write!(f, "{p}:{c}"),
            (Some(p), None) => f.write_str(p),
            (None, Some(c)) => f.write_str(c),
            (None, None) => Ok(()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numeric_str(
            self.partition.as_deref().unwrap_or_default(),
            other.partition.as_deref().unwrap_or_default(),
        )
        .then_with(|| self.partition.cmp(&other.partition))
        .then_with(|| self.category.cmp(&other.category))
    }
}

/// A registered task waiting to be launched.
pub(crate) struct PendingTask {
    pub id: TaskId,
    pub sort_key: SortKey,
    pub task: Box<dyn Task>,
}

/// Unit of scheduling. Topology (`notify`) is fixed after build; the other
/// fields change while the plan executes.
pub(crate) struct ExecutionGroup {
    pub key: GroupKey,
    pub pending: VecDeque<PendingTask>,
    pub running: usize,
    /// Groups that must drain before this one may start.
    pub waiting_on: HashSet<usize>,
    /// Groups to release when this one drains.
    pub notify: Vec<usize>,
}

impl ExecutionGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            pending: VecDeque::new(),
            running: 0,
            waiting_on: HashSet::new(),
            notify: Vec::new(),
        }
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.running == 0
    }
}

/// Groups plus the initial runnable frontier.
pub(crate) struct ExecutionPlan {
    pub groups: Vec<ExecutionGroup>,
    pub lookup: HashMap<GroupKey, usize>,
    pub frontier: Vec<usize>,
    pub task_count: usize,
}

impl ExecutionPlan {
    pub fn group(&self, key: &GroupKey) -> Option<&ExecutionGroup> {
        self.lookup.get(key).map(|&idx| &self.groups[idx])
    }
}
