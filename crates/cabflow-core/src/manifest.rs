//! Tick manifest: audit record of one successful sensor evaluation.
//!
//! The runtime emits a manifest after the next cursor is persisted; comparing
//! `cursor_before` and `cursor_after` shows whether the tick moved the sensor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickManifest {
    pub id: ManifestId,

    pub sensor: String,

    /// Digest of the cursor the tick started from.
    pub cursor_before: Hash256,

    /// Digest of the cursor the tick persisted.
    pub cursor_after: Hash256,

    /// Digest of the emitted run keys, in emission order.
    pub triggers_digest: Hash256,

    pub trigger_count: usize,

    /// Files present in the watched directory after the tick.
    pub tracked_files: usize,

    /// cabflow version string for provenance.
    pub version: String,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

/// Counts filled in when a tick completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub trigger_count: usize,
    pub tracked_files: usize,
}

impl TickManifest {
    pub fn new(sensor: impl Into<String>, cursor_before: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            sensor: sensor.into(),
            cursor_before,
            cursor_after: cursor_before,
            triggers_digest: Hash256([0u8; 32]),
            trigger_count: 0,
            tracked_files: 0,
            version: crate::VERSION.to_string(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(
        mut self,
        cursor_after: Hash256,
        triggers_digest: Hash256,
        stats: TickStats,
        finished_ms: u64,
    ) -> Self {
        self.cursor_after = cursor_after;
        self.triggers_digest = triggers_digest;
        self.trigger_count = stats.trigger_count;
        self.tracked_files = stats.tracked_files;
        self.finished_ms = finished_ms;
        self
    }

    pub fn cursor_advanced(&self) -> bool {
        self.cursor_before != self.cursor_after
    }
}
