#![forbid(unsafe_code)]
//! cabflow: request-file sensors for a partitioned taxi-trip analytics pipeline.
//!
//! Facade over the workspace crates; integration tests under `tests/` build
//! against it.

pub use cabflow_core::prelude;
pub use cabflow_exec as exec;
pub use cabflow_sensor as sensor;
