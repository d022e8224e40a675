//! Convenient re-exports for downstream crates.

pub use crate::config::{DaemonConfig, SensorConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_serde, Hash256};
pub use crate::id::{AssetKey, JobName, RunKey};
pub use crate::manifest::{ManifestId, TickManifest, TickStats};
pub use crate::snapshot::{ModTime, Snapshot};
pub use crate::trigger::{Payload, Trigger, DEFAULT_RUN_KEY_PREFIX, FILENAME_FIELD};
