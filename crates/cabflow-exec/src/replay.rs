//! Deterministic replay & provenance helpers.
//!
//! Manifest digests cover the cursor before and after a tick and the emitted
//! run keys. Re-polling an unchanged directory from the same starting cursor
//! must reproduce both, which is how idempotence is checked after the fact.

use cabflow_core::hash::{hash_serde, Hash256};
use cabflow_core::manifest::TickManifest;
use cabflow_core::snapshot::Snapshot;
use cabflow_core::trigger::Trigger;
use cabflow_sensor::PollOutcome;

use crate::ExecError;

pub fn hash_cursor(snapshot: &Snapshot) -> Result<Hash256, ExecError> {
    Ok(hash_serde(snapshot)?)
}

/// Hash the run keys in emission order.
pub fn hash_run_keys(triggers: &[Trigger]) -> Result<Hash256, ExecError> {
    let keys: Vec<&str> = triggers.iter().map(|t| t.run_key.as_str()).collect();
    Ok(hash_serde(&keys)?)
}

/// True when `outcome` reproduces the cursor and run keys recorded in `manifest`.
pub fn matches_manifest(outcome: &PollOutcome, manifest: &TickManifest) -> Result<bool, ExecError> {
    Ok(hash_cursor(&outcome.next_snapshot)? == manifest.cursor_after
        && hash_run_keys(&outcome.triggers)? == manifest.triggers_digest)
}
