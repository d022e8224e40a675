//! Triggers: one deduplicated request to run downstream work.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::id::RunKey;
use crate::snapshot::ModTime;

/// Parsed request content, always a JSON object.
pub type Payload = Map<String, Value>;

/// Field the request file name is written to in every payload.
pub const FILENAME_FIELD: &str = "filename";

/// Run-key prefix used when a sensor does not configure its own.
pub const DEFAULT_RUN_KEY_PREFIX: &str = "adhoc_request";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub run_key: RunKey,
    pub file_name: String,
    pub mtime: ModTime,
    /// Parsed file content plus the `filename` field.
    pub payload: Payload,
}

impl Trigger {
    /// Build a trigger for one observed file version.
    ///
    /// The file name is written after the parsed content, so it replaces any
    /// `filename` key the request itself carried.
    pub fn new(prefix: &str, file_name: &str, mtime: ModTime, content: Payload) -> Self {
        let mut payload = content;
        payload.insert(FILENAME_FIELD.to_string(), Value::String(file_name.to_string()));
        Self {
            run_key: RunKey::for_file(prefix, file_name, mtime),
            file_name: file_name.to_string(),
            mtime,
            payload,
        }
    }

    /// Run configuration handed to the target job: the payload becomes the
    /// config of op `op`.
    pub fn run_config(&self, op: &str) -> Value {
        json!({ "ops": { op: { "config": self.payload } } })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(v: Value) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn payload_merges_filename() {
        let t = Trigger::new(
            DEFAULT_RUN_KEY_PREFIX,
            "req1.json",
            ModTime::from_secs_f64(100.0),
            content(json!({"foo": 1})),
        );
        assert_eq!(Value::Object(t.payload.clone()), json!({"foo": 1, "filename": "req1.json"}));
        assert_eq!(t.run_key.as_str(), "adhoc_request_req1.json_100");
    }

    #[test]
    fn filename_wins_over_request_field() {
        let t = Trigger::new(
            "p",
            "real.json",
            ModTime::from_secs_f64(1.0),
            content(json!({"filename": "spoofed.json", "borough": "Manhattan"})),
        );
        assert_eq!(t.payload["filename"], json!("real.json"));
        assert_eq!(t.payload["borough"], json!("Manhattan"));
    }

    #[test]
    fn run_config_nests_payload_under_op() {
        let t = Trigger::new(
            "p",
            "r.json",
            ModTime::from_secs_f64(2.5),
            content(json!({"start_date": "2023-01-01"})),
        );
        assert_eq!(
            t.run_config("adhoc_request"),
            json!({"ops": {"adhoc_request": {"config": {
                "start_date": "2023-01-01",
                "filename": "r.json"
            }}}})
        );
    }
}
