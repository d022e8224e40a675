#![forbid(unsafe_code)]
//! cabflow-exec: evaluate registered sensors against persisted cursors.
//!
//! A tick loads a sensor's cursor, polls its request directory, hands every
//! trigger to a `RunSink`, and only then persists the next cursor. Failed ticks
//! leave the stored cursor untouched.

pub mod cursor;
pub mod metrics;
pub mod registry;
pub mod replay;
pub mod runtime;
pub mod sink;

pub use cursor::{CursorStore, FileCursorStore, MemoryCursorStore};
pub use registry::{parse_yaml_sensors, parse_yaml_sensors_with, DaemonOverrides, ParsedSensors, SensorDef, SensorRegistry};
pub use runtime::{ExecError, SensorDaemon, SensorTick};
pub use sink::{CollectingSink, JsonlRunSink, RunRequest, RunSink};
