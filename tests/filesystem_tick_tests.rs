//! End-to-end ticks against a real directory and file-backed cursors.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use cabflow_core::config::SensorConfig;
use cabflow_core::snapshot::ModTime;
use cabflow_exec::{
    CollectingSink, CursorStore, FileCursorStore, JsonlRunSink, SensorDaemon, SensorDef,
    SensorRegistry,
};
use serde_json::{json, Value};

struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let mut root = std::env::temp_dir();
        root.push(format!("cabflow-e2e-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("requests")).unwrap();
        Self { root }
    }

    fn requests(&self) -> PathBuf {
        self.root.join("requests")
    }

    fn state(&self) -> PathBuf {
        self.root.join("state")
    }

    fn write(&self, name: &str, body: &str, secs: u64) {
        let path = self.requests().join(name);
        fs::write(&path, body).unwrap();
        set_mtime(&path, secs);
    }

    fn daemon(&self) -> SensorDaemon<FileCursorStore> {
        let mut registry = SensorRegistry::new();
        let config = SensorConfig {
            directory: self.requests().to_string_lossy().to_string(),
            ..Default::default()
        };
        registry
            .register(SensorDef::new("adhoc_request_sensor", "adhoc_request_job", config))
            .unwrap();
        SensorDaemon::new(&registry, FileCursorStore::new(self.state())).unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn set_mtime(path: &Path, secs: u64) {
    let f = File::options().write(true).open(path).unwrap();
    f.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
}

#[test]
fn test_first_tick_then_quiet_tick() {
    let ws = Workspace::new("quiet");
    ws.write("req1.json", r#"{"start_date": "2023-03-01", "borough": "Manhattan"}"#, 100);
    let daemon = ws.daemon();

    let mut sink = CollectingSink::new();
    let m = daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    assert_eq!(m.trigger_count, 1);
    assert_eq!(sink.run_keys(), vec!["adhoc_request_req1.json_100"]);
    assert_eq!(
        sink.requests[0].run_config,
        json!({"ops": {"adhoc_request": {"config": {
            "start_date": "2023-03-01",
            "borough": "Manhattan",
            "filename": "req1.json"
        }}}})
    );

    let stored = FileCursorStore::new(ws.state())
        .load("adhoc_request_sensor")
        .unwrap();
    assert_eq!(stored.get("req1.json"), Some(ModTime::from_secs_f64(100.0)));

    let m2 = daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    assert_eq!(m2.trigger_count, 0);
    assert_eq!(sink.requests.len(), 1);
}

#[test]
fn test_edit_in_place_retriggers() {
    let ws = Workspace::new("edit");
    ws.write("req1.json", r#"{"v": 1}"#, 100);
    let daemon = ws.daemon();
    let mut sink = CollectingSink::new();
    daemon.tick("adhoc_request_sensor", &mut sink).unwrap();

    ws.write("req1.json", r#"{"v": 2}"#, 150);
    daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    assert_eq!(
        sink.run_keys(),
        vec!["adhoc_request_req1.json_100", "adhoc_request_req1.json_150"]
    );
    assert_eq!(
        sink.requests[1].run_config["ops"]["adhoc_request"]["config"]["v"],
        json!(2)
    );
}

#[test]
fn test_bad_file_blocks_cursor_until_fixed() {
    let ws = Workspace::new("bad");
    ws.write("req1.json", "{}", 100);
    let daemon = ws.daemon();
    let mut sink = CollectingSink::new();
    daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    let cursor_path = FileCursorStore::new(ws.state()).path_for("adhoc_request_sensor");
    let before = fs::read_to_string(&cursor_path).unwrap();

    ws.write("req2.json", "{ definitely not json", 200);
    let err = daemon.tick("adhoc_request_sensor", &mut sink).unwrap_err();
    assert!(err.to_string().contains("req2.json"), "{err}");
    assert_eq!(fs::read_to_string(&cursor_path).unwrap(), before);

    fs::remove_file(ws.requests().join("req2.json")).unwrap();
    let m = daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    assert_eq!(m.trigger_count, 0);
    assert_eq!(sink.requests.len(), 1);
}

#[test]
fn test_missing_directory_fails_without_cursor() {
    let ws = Workspace::new("missing");
    let daemon = ws.daemon();
    fs::remove_dir_all(ws.requests()).unwrap();

    let err = daemon
        .tick("adhoc_request_sensor", &mut CollectingSink::new())
        .unwrap_err();
    assert!(err.to_string().contains("cannot access watched directory"), "{err}");
    assert!(!FileCursorStore::new(ws.state())
        .path_for("adhoc_request_sensor")
        .exists());
}

#[test]
fn test_jsonl_output_lines() {
    let ws = Workspace::new("jsonl");
    ws.write("a.json", r#"{"x": 1}"#, 10);
    ws.write("b.json", r#"{"x": 2}"#, 20);
    let daemon = ws.daemon();

    let out_path = ws.root.join("runs.jsonl");
    {
        let mut sink = JsonlRunSink::to_path(&out_path).unwrap();
        daemon.tick("adhoc_request_sensor", &mut sink).unwrap();
    }
    let text = fs::read_to_string(&out_path).unwrap();
    let keys: Vec<String> = text
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["run_key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["adhoc_request_a.json_10", "adhoc_request_b.json_20"]);
}
