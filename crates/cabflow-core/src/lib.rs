#![forbid(unsafe_code)]
//! cabflow-core: the data model shared by every cabflow crate.
//!
//! Snapshots (file name -> modification time), run keys, triggers, tick
//! manifests, configuration, errors, and stable hashing live here. The core
//! crate performs no I/O; sources and cursor stores are implemented by
//! `cabflow-sensor` and `cabflow-exec`.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod snapshot;
pub mod translate;
pub mod trigger;

pub use error::{Error, Result};

/// Crate version recorded in tick manifests for provenance.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
