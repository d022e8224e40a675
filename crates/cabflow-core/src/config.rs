//! Sensor and daemon configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::trigger::DEFAULT_RUN_KEY_PREFIX;

/// How one sensor watches its request directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Watched directory: a bare path, `file://` URI, or `memory://` for tests.
    pub directory: String,

    /// Extension (without the dot) a file must have to be watched.
    pub extension: String,

    /// Prefix of every run key this sensor emits.
    pub run_key_prefix: String,

    /// Minimum seconds between two evaluations of this sensor.
    pub min_interval_secs: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            directory: "data/requests".to_string(),
            extension: "json".to_string(),
            run_key_prefix: DEFAULT_RUN_KEY_PREFIX.to_string(),
            min_interval_secs: 30,
        }
    }
}

impl SensorConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `CABFLOW_REQUESTS_DIR`: watched directory
    /// - `CABFLOW_REQUEST_EXTENSION`: watched file extension
    /// - `CABFLOW_RUN_KEY_PREFIX`: run-key prefix
    /// - `CABFLOW_MIN_INTERVAL_SECS`: minimum evaluation interval
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SensorConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = lookup("CABFLOW_REQUESTS_DIR") {
            cfg.directory = s;
        }

        if let Some(s) = lookup("CABFLOW_REQUEST_EXTENSION") {
            cfg.extension = normalize_extension(&s);
        }

        if let Some(s) = lookup("CABFLOW_RUN_KEY_PREFIX") {
            cfg.run_key_prefix = s;
        }

        if let Some(s) = lookup("CABFLOW_MIN_INTERVAL_SECS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.min_interval_secs = v;
            }
        }

        cfg
    }

    /// URI scheme of `directory`, if it has one.
    pub fn scheme(&self) -> Option<&str> {
        self.directory
            .split_once("://")
            .map(|(s, _)| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Local path of the watched directory (`file://` stripped).
    pub fn directory_path(&self) -> String {
        match self.scheme() {
            Some("file") => {
                file_uri_to_path(&self.directory).unwrap_or_else(|| self.directory.clone())
            }
            _ => self.directory.clone(),
        }
    }
}

/// Settings of the process that evaluates sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Directory holding one cursor file per sensor.
    pub state_dir: String,

    /// Seconds between evaluation rounds in `watch` mode.
    pub tick_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            state_dir: ".cabflow/state".to_string(),
            tick_interval_secs: 30,
        }
    }
}

impl DaemonConfig {
    /// Environment variables:
    /// - `CABFLOW_STATE_DIR`: cursor directory
    /// - `CABFLOW_TICK_INTERVAL_SECS`: seconds between rounds
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("CABFLOW_STATE_DIR") {
            cfg.state_dir = s;
        }

        if let Ok(s) = std::env::var("CABFLOW_TICK_INTERVAL_SECS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.tick_interval_secs = v;
            }
        }

        cfg
    }
}

/// Canonical form of a watched extension: no leading dot, lowercase.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        let mut cfg = SensorConfig::default();
        assert_eq!(cfg.scheme(), None);
        cfg.directory = "file:///srv/requests".into();
        assert_eq!(cfg.scheme(), Some("file"));
        assert_eq!(cfg.directory_path(), "/srv/requests");
        cfg.directory = "memory://".into();
        assert_eq!(cfg.scheme(), Some("memory"));
    }

    #[test]
    fn defaults_match_adhoc_request_sensor() {
        let cfg = SensorConfig::default();
        assert_eq!(cfg.extension, "json");
        assert_eq!(cfg.run_key_prefix, "adhoc_request");
        assert_eq!(cfg.directory_path(), "data/requests");
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars = [
            ("CABFLOW_REQUESTS_DIR", "/srv/requests"),
            ("CABFLOW_REQUEST_EXTENSION", ".YML"),
            ("CABFLOW_MIN_INTERVAL_SECS", "not-a-number"),
        ];
        let cfg = SensorConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        });
        assert_eq!(cfg.directory, "/srv/requests");
        assert_eq!(cfg.extension, "yml");
        assert_eq!(cfg.run_key_prefix, "adhoc_request");
        // Unparsable numbers keep the default.
        assert_eq!(cfg.min_interval_secs, 30);
    }

    #[test]
    fn extensions_normalize_to_lowercase_without_dot() {
        assert_eq!(normalize_extension(".JSON"), "json");
        assert_eq!(normalize_extension("Yml"), "yml");
        assert_eq!(normalize_extension(" yaml "), "yaml");
    }
}
