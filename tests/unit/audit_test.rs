//! Tests for audit sink

use env_reaper::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use uuid::Uuid;

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let run_id = Uuid::new_v4();

    let event = build_audit_event(
        run_id,
        "env1:rds.db",
        Some(1),
        AuditAction::TaskFailed,
        Some("payload".to_string()),
    );

    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].run_id, run_id);
    assert_eq!(events[0].group, "env1:rds.db");
    assert_eq!(events[0].task_id, Some(1));
    assert_eq!(events[0].action, AuditAction::TaskFailed);
    assert_eq!(events[0].payload.as_deref(), Some("payload"));
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);
    let run_id = Uuid::new_v4();

    sink.record(build_audit_event(run_id, "g1", Some(1), AuditAction::TaskStarted, None));
    sink.record(build_audit_event(run_id, "g1", Some(2), AuditAction::TaskStarted, None));
    sink.record(build_audit_event(run_id, "g1", Some(3), AuditAction::TaskStarted, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, Some(2)); // First one popped
    assert_eq!(events[1].task_id, Some(3));
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryAuditSink::new(10);
    let handle = sink.clone();
    let run_id = Uuid::new_v4();

    sink.record(build_audit_event(run_id, "env1:ec2.vpc", None, AuditAction::GroupQueued, None));
    sink.record(build_audit_event(run_id, "env1:ec2.vpc", None, AuditAction::GroupDrained, None));

    assert_eq!(handle.events().len(), 2);
    assert_eq!(handle.events_for(AuditAction::GroupDrained).len(), 1);
    assert!(handle.events_for(AuditAction::RunAborted).is_empty());
}

#[test]
fn test_audit_event_serializes_action_snake_case() {
    let event = build_audit_event(Uuid::nil(), "env1", None, AuditAction::GroupUnblocked, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "group_unblocked");
    assert_eq!(json["group"], "env1");
}
