//! Audit sink implementations.
//!
//! The scheduler reports group and task lifecycle transitions to an optional
//! sink. The in-memory sink keeps a bounded buffer for tests and diagnostics.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::task::TaskId;
use crate::util::clock::now_ms;

/// Scheduler lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Group entered the runnable queue.
    GroupQueued,
    /// Task was launched.
    TaskStarted,
    /// Task settled successfully.
    TaskCompleted,
    /// Task settled with an error.
    TaskFailed,
    /// Group has no pending or running tasks left.
    GroupDrained,
    /// Group's last blocker drained.
    GroupUnblocked,
    /// Run stopped launching new work after a failure.
    RunAborted,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Run the event belongs to.
    pub run_id: Uuid,
    /// Group key in `partition:category` form.
    pub group: String,
    /// Related task, for task-level actions.
    pub task_id: Option<TaskId>,
    /// Transition recorded.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, such as an error message.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
///
/// Clones share the same buffer, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events for one action, in recording order.
    #[must_use]
    pub fn events_for(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    run_id: Uuid,
    group: impl Into<String>,
    task_id: Option<TaskId>,
    action: AuditAction,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        run_id,
        group: group.into(),
        task_id,
        action,
        created_at_ms: now_ms(),
        payload,
    }
}
