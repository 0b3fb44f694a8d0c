//! Task abstraction and registration parameters.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::compare::compare_numeric_str;

/// Identifier assigned to a task at registration, in registration order.
pub type TaskId = u64;

/// Result produced by a task. Any error counts as a failure.
pub type TaskResult = anyhow::Result<()>;

/// An opaque unit of asynchronous work.
///
/// The scheduler never inspects what a task does; it only runs it once and
/// observes whether it succeeded. Closures returning a future implement this
/// trait automatically:
///
/// ```rust
/// use env_reaper::core::{SchedulerBuilder, TaskParams};
///
/// let mut builder = SchedulerBuilder::default();
/// builder.add_task(
///     || async {
///         // delete something remote
///         Ok(())
///     },
///     TaskParams::new().partition("pr-42").category("ec2.subnet"),
/// );
/// ```
#[async_trait]
pub trait Task: Send + 'static {
    /// Run the task to completion.
    async fn run(self: Box<Self>) -> TaskResult;
}

#[async_trait]
impl<F, Fut> Task for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn run(self: Box<Self>) -> TaskResult {
        (*self)().await
    }
}

/// Position of a task within its group.
///
/// Two numbers compare numerically; anything else compares as text with digit
/// runs ordered by value, so `"a-2"` sorts before `"a-10"`.
///
/// Numeric keys are integers in the `i64` range. Deserializing a fractional
/// or out-of-range number fails; pass such values as strings instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    /// Numeric key.
    Number(i64),
    /// Textual key, typically a resource identifier.
    Text(String),
}

impl SortKey {
    /// Total order used when sorting a group's pending tasks.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            _ => compare_numeric_str(&self.to_string(), &other.to_string()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SortKey {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for SortKey {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for SortKey {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Parameters describing where a task belongs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskParams {
    /// Independent scheduling domain, e.g. an environment name.
    pub partition: Option<String>,
    /// Semantic resource type used for dependency lookups.
    pub category: Option<String>,
    /// Launch position within the group; defaults to the registration counter.
    pub sort_key: Option<SortKey>,
}

impl TaskParams {
    /// Empty parameters: no partition, no category, registration order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partition key.
    #[must_use]
    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set an explicit sort key.
    #[must_use]
    pub fn sort_key(mut self, key: impl Into<SortKey>) -> Self {
        self.sort_key = Some(key.into());
        self
    }
}
