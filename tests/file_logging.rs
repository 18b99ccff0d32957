mod common;

use gridlock::WorkerSpec;
use serde_json::Value;
use std::fs;
use std::time::Duration;

#[test]
fn file_log_captures_the_event_stream_as_json_lines() {
    let log = tempfile::NamedTempFile::new().expect("failed to create temp log");

    let (builder, rx) = common::channel_builder(15, 150);
    let mut session = builder
        .resources(["A", "B"])
        .worker(
            WorkerSpec::new([0, 1])
                .with_stagger(Duration::from_millis(20))
                .with_hold(Duration::from_millis(20)),
        )
        .with_log(log.path())
        .start()
        .expect("failed to start session");

    common::assert_no_deadlock(&rx, common::NO_DEADLOCK_TIMEOUT);
    session.join_workers();
    session.shutdown();

    let contents = fs::read_to_string(log.path()).expect("failed to read log");
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("every log line must be valid JSON"))
        .collect();
    assert!(!lines.is_empty(), "the run must have produced events");

    for line in &lines {
        assert!(line.get("event").is_some(), "line missing event tag: {line}");
        assert!(
            line.get("timestamp").and_then(Value::as_f64).is_some(),
            "line missing timestamp: {line}"
        );
    }

    let events: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.get("event").and_then(Value::as_str))
        .collect();
    assert!(events.contains(&"attempt"));
    assert!(events.contains(&"acquired"));
    assert!(events.contains(&"released"));
}
