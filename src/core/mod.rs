//! Core scheduling abstractions: tasks, plans, execution and reporting.

pub mod audit;
pub mod compare;
pub mod error;
pub mod graph;
pub mod plan;
pub mod report;
pub mod scheduler;
pub mod task;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use compare::compare_numeric_str;
pub use error::{PollError, SchedulerError};
pub use graph::{CategoryDependencies, CategoryGraph};
pub use plan::GroupKey;
pub use report::{ExecutionReport, SkipReason, TaskOutcome, TaskStatus};
pub use scheduler::Scheduler;
pub use task::{SortKey, Task, TaskId, TaskParams, TaskResult};

pub use crate::builders::SchedulerBuilder;
