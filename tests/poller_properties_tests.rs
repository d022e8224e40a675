//! Change-detection properties of the poller over an in-memory directory.

use cabflow_core::error::Error;
use cabflow_core::snapshot::{ModTime, Snapshot};
use cabflow_sensor::{JsonParser, MemoryRequestSource, PollOutcome, Poller};
use serde_json::{json, Value};

fn poller(src: &MemoryRequestSource) -> Poller<MemoryRequestSource, JsonParser> {
    Poller::new(src.clone(), JsonParser, "adhoc_request")
}

fn snap(entries: &[(&str, f64)]) -> Snapshot {
    entries
        .iter()
        .map(|(n, m)| (n.to_string(), ModTime::from_secs_f64(*m)))
        .collect()
}

fn names(out: &PollOutcome) -> Vec<&str> {
    out.triggers.iter().map(|t| t.file_name.as_str()).collect()
}

fn seeded(n: usize) -> MemoryRequestSource {
    let src = MemoryRequestSource::new();
    for i in 0..n {
        src.insert(
            format!("req{i:02}.json"),
            1_690_000_000.0 + i as f64,
            format!(r#"{{"index": {i}}}"#),
        );
    }
    src
}

#[test]
fn test_idempotent_for_same_inputs() {
    let src = seeded(4);
    let prev = snap(&[("req01.json", 1_690_000_001.0)]);

    let a = poller(&src).poll(&prev).unwrap();
    let b = poller(&src).poll(&prev).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_first_run_triggers_every_file() {
    let src = seeded(5);
    let out = poller(&src).poll(&Snapshot::new()).unwrap();
    assert_eq!(out.triggers.len(), 5);
    assert_eq!(out.next_snapshot.len(), 5);
}

#[test]
fn test_no_false_triggers() {
    let src = seeded(3);
    let first = poller(&src).poll(&Snapshot::new()).unwrap();
    let second = poller(&src).poll(&first.next_snapshot).unwrap();
    assert!(second.triggers.is_empty());
    assert_eq!(second.next_snapshot, first.next_snapshot);
}

#[test]
fn test_touching_one_file_triggers_only_it() {
    let src = seeded(3);
    let first = poller(&src).poll(&Snapshot::new()).unwrap();

    assert!(src.touch("req01.json", 1_700_000_000.5));
    let second = poller(&src).poll(&first.next_snapshot).unwrap();
    assert_eq!(names(&second), vec!["req01.json"]);
    assert_eq!(
        second.next_snapshot.get("req01.json"),
        Some(ModTime::from_secs_f64(1_700_000_000.5))
    );
}

#[test]
fn test_mtime_moving_backwards_still_triggers() {
    let src = seeded(1);
    let first = poller(&src).poll(&Snapshot::new()).unwrap();
    src.touch("req00.json", 1.0);
    let second = poller(&src).poll(&first.next_snapshot).unwrap();
    assert_eq!(second.triggers.len(), 1);
}

#[test]
fn test_deleted_file_is_forgotten_without_trigger() {
    let src = seeded(2);
    let first = poller(&src).poll(&Snapshot::new()).unwrap();

    src.remove("req00.json");
    let second = poller(&src).poll(&first.next_snapshot).unwrap();
    assert!(second.triggers.is_empty());
    assert!(!second.next_snapshot.contains("req00.json"));
    assert!(second.next_snapshot.contains("req01.json"));
}

#[test]
fn test_dedup_key_stable_until_mtime_changes() {
    let src = seeded(1);
    let k1 = poller(&src).poll(&Snapshot::new()).unwrap().triggers[0]
        .run_key
        .clone();
    let k2 = poller(&src).poll(&Snapshot::new()).unwrap().triggers[0]
        .run_key
        .clone();
    assert_eq!(k1, k2);

    src.touch("req00.json", 1_690_000_000.25);
    let k3 = poller(&src).poll(&Snapshot::new()).unwrap().triggers[0]
        .run_key
        .clone();
    assert_ne!(k1, k3);
}

#[test]
fn test_scenario_first_request() {
    let src = MemoryRequestSource::new();
    src.insert("req1.json", 100.0, r#"{"foo": 1}"#);

    let out = poller(&src).poll(&Snapshot::new()).unwrap();
    assert_eq!(out.triggers.len(), 1);
    assert_eq!(
        Value::Object(out.triggers[0].payload.clone()),
        json!({"foo": 1, "filename": "req1.json"})
    );
    assert_eq!(out.next_snapshot, snap(&[("req1.json", 100.0)]));
}

#[test]
fn test_scenario_second_request_added() {
    let src = MemoryRequestSource::new();
    src.insert("req1.json", 100.0, r#"{"foo": 1}"#);
    src.insert("req2.json", 200.0, r#"{"foo": 2}"#);

    let out = poller(&src).poll(&snap(&[("req1.json", 100.0)])).unwrap();
    assert_eq!(names(&out), vec!["req2.json"]);
    assert_eq!(
        out.next_snapshot,
        snap(&[("req1.json", 100.0), ("req2.json", 200.0)])
    );
}

#[test]
fn test_scenario_directory_emptied() {
    let src = MemoryRequestSource::new();
    let out = poller(&src).poll(&snap(&[("req1.json", 100.0)])).unwrap();
    assert!(out.triggers.is_empty());
    assert!(out.next_snapshot.is_empty());
}

#[test]
fn test_parse_error_is_atomic_and_names_file() {
    let src = seeded(3);
    src.insert("req99.json", 5.0, "[1, 2]");

    let err = poller(&src).poll(&Snapshot::new()).unwrap_err();
    match err {
        Error::ContentParse { file, reason } => {
            assert_eq!(file, "req99.json");
            assert!(reason.contains("mapping"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unwatched_extension_is_ignored() {
    let src = seeded(1);
    src.insert("notes.txt", 1.0, "not a request");
    let out = poller(&src).poll(&Snapshot::new()).unwrap();
    assert_eq!(names(&out), vec!["req00.json"]);
    assert!(!out.next_snapshot.contains("notes.txt"));
}
