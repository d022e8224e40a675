//! Tick logging hooks.
//!
//! No telemetry stack here; with the `tracing` feature these become structured
//! events, otherwise they compile to nothing. Subscribers are installed by the
//! binary layer.

use cabflow_core::manifest::TickManifest;

use crate::ExecError;

#[cfg(feature = "tracing")]
pub fn emit_tick(m: &TickManifest) {
    tracing::info!(
        sensor = %m.sensor,
        triggers = m.trigger_count,
        tracked = m.tracked_files,
        cursor = %m.cursor_after.short(),
        advanced = m.cursor_advanced(),
        elapsed_ms = m.finished_ms.saturating_sub(m.started_ms),
        "sensor tick"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn emit_tick(_m: &TickManifest) { /* no-op */
}

#[cfg(feature = "tracing")]
pub fn emit_tick_failure(sensor: &str, err: &ExecError) {
    tracing::warn!(sensor, error = %err, "sensor tick failed; cursor not advanced");
}

#[cfg(not(feature = "tracing"))]
pub fn emit_tick_failure(_sensor: &str, _err: &ExecError) { /* no-op */
}
