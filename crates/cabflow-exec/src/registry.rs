//! Sensor registry: unique sensor name -> what it watches and which job it feeds.
//!
//! Registries are built in code or from a small YAML document:
//! ```yaml
//! daemon:
//!   state_dir: ".cabflow/state"
//! sensors:
//!   - name: adhoc_request_sensor
//!     job: adhoc_request_job
//!     op: adhoc_request
//!     directory: data/requests
//!     extension: json
//! ```
//!
//! Keys a sensor entry leaves out come from `SensorConfig::from_env`, so the
//! effective order is environment, then the file, then CLI flags. Unknown keys
//! are rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cabflow_core::config::{normalize_extension, DaemonConfig, SensorConfig};
use cabflow_core::id::JobName;
use cabflow_sensor::{build_source_from_config, parser_for_extension};

use crate::ExecError;

fn default_op() -> String {
    "adhoc_request".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDef {
    pub name: String,
    /// Job every trigger of this sensor is submitted to.
    pub job: JobName,
    /// Op whose config receives the request payload.
    pub op: String,
    #[serde(flatten)]
    pub config: SensorConfig,
}

impl SensorDef {
    pub fn new(name: impl Into<String>, job: impl Into<String>, mut config: SensorConfig) -> Self {
        config.extension = normalize_extension(&config.extension);
        Self {
            name: name.into(),
            job: JobName::new(job),
            op: default_op(),
            config,
        }
    }

    pub fn validate(&self) -> Result<(), ExecError> {
        let valid_name = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            // Names double as cursor file names.
            return Err(ExecError::Registry(format!(
                "sensor name '{}' must be non-empty and use only [A-Za-z0-9_-]",
                self.name
            )));
        }
        if self.job.as_str().trim().is_empty() {
            return Err(ExecError::Registry(format!(
                "sensor '{}' has no target job",
                self.name
            )));
        }
        if self.op.trim().is_empty() {
            return Err(ExecError::Registry(format!(
                "sensor '{}' has an empty op name",
                self.name
            )));
        }
        parser_for_extension(&self.config.extension)?;
        build_source_from_config(&self.config)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: BTreeMap<String, SensorDef>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sensor; names must be unique.
    pub fn register(&mut self, def: SensorDef) -> Result<(), ExecError> {
        def.validate()?;
        if self.sensors.contains_key(&def.name) {
            return Err(ExecError::Registry(format!(
                "sensor '{}' registered twice",
                def.name
            )));
        }
        self.sensors.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SensorDef> {
        self.sensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorDef> {
        self.sensors.values()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Daemon settings a definitions file may override; unset fields keep the
/// environment/default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonOverrides {
    pub state_dir: Option<String>,
    pub tick_interval_secs: Option<u64>,
}

impl DaemonOverrides {
    pub fn apply(&self, cfg: &mut DaemonConfig) {
        if let Some(dir) = &self.state_dir {
            cfg.state_dir = dir.clone();
        }
        if let Some(secs) = self.tick_interval_secs {
            cfg.tick_interval_secs = secs;
        }
    }
}

/// One `sensors:` entry as written. Absent keys fall back to a base config.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SensorEntry {
    name: String,
    job: JobName,
    #[serde(default = "default_op")]
    op: String,
    directory: Option<String>,
    extension: Option<String>,
    run_key_prefix: Option<String>,
    min_interval_secs: Option<u64>,
}

impl SensorEntry {
    fn into_def(self, base: &SensorConfig) -> SensorDef {
        let config = SensorConfig {
            directory: self.directory.unwrap_or_else(|| base.directory.clone()),
            extension: self.extension.unwrap_or_else(|| base.extension.clone()),
            run_key_prefix: self
                .run_key_prefix
                .unwrap_or_else(|| base.run_key_prefix.clone()),
            min_interval_secs: self.min_interval_secs.unwrap_or(base.min_interval_secs),
        };
        SensorDef {
            op: self.op,
            ..SensorDef::new(self.name, self.job.into_inner(), config)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SensorsDoc {
    #[serde(default)]
    daemon: Option<DaemonOverrides>,
    #[serde(default)]
    sensors: Vec<SensorEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedSensors {
    pub registry: SensorRegistry,
    pub daemon: DaemonOverrides,
}

/// Parse a YAML definitions document into a validated registry, filling
/// unset sensor keys from the `CABFLOW_*` environment.
pub fn parse_yaml_sensors(yaml_src: &str) -> Result<ParsedSensors, ExecError> {
    parse_yaml_sensors_with(yaml_src, &SensorConfig::from_env())
}

/// Like [`parse_yaml_sensors`], with an explicit base for unset keys.
pub fn parse_yaml_sensors_with(
    yaml_src: &str,
    base: &SensorConfig,
) -> Result<ParsedSensors, ExecError> {
    let doc: SensorsDoc = serde_yaml::from_str(yaml_src)?;
    if doc.sensors.is_empty() {
        return Err(ExecError::Registry("no sensors defined".into()));
    }
    let mut registry = SensorRegistry::new();
    for entry in doc.sensors {
        registry.register(entry.into_def(base))?;
    }
    Ok(ParsedSensors {
        registry,
        daemon: doc.daemon.unwrap_or_default(),
    })
}
