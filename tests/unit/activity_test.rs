//! Tests for the process activity log

use std::time::Duration;

use stress_scheduler::core::{
    ActivityAction, ActivityRecord, ActivitySink, FileActivitySink, InMemoryActivitySink,
};

fn record(action: ActivityAction, pid: u32) -> ActivityRecord {
    ActivityRecord {
        elapsed: Duration::from_millis(1250),
        action,
        nick: "subscriber-3-1".to_string(),
        pid,
        args: vec!["./subscriber".to_string(), "-s".to_string()],
    }
}

#[test]
fn test_in_memory_sink_is_bounded() {
    let mut sink = InMemoryActivitySink::new(2);
    sink.record(record(ActivityAction::Run, 1));
    sink.record(record(ActivityAction::Interrupt, 1));
    sink.record(record(ActivityAction::Kill, 2));

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, ActivityAction::Interrupt);
    assert_eq!(records[1].action, ActivityAction::Kill);
}

#[test]
fn test_file_sink_writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.log");
    {
        let mut sink = FileActivitySink::create(&path).unwrap();
        sink.record(record(ActivityAction::Run, 10));
        sink.record(record(ActivityAction::Kill, 10));
    }
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("RUN subscriber-3-1 10"));
    assert!(lines[1].contains("SIGKILL subscriber-3-1 10"));
}
