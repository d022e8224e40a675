//! Cursor persistence: one serialized `Snapshot` per sensor.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cabflow_core::error::Error as CoreError;
use cabflow_core::snapshot::Snapshot;

use crate::ExecError;

pub trait CursorStore {
    /// Last persisted snapshot; empty if the sensor never completed a tick.
    fn load(&self, sensor: &str) -> Result<Snapshot, ExecError>;

    fn save(&self, sensor: &str, snapshot: &Snapshot) -> Result<(), ExecError>;
}

/// Stores `<root>/<sensor>.cursor.json`, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    root: PathBuf,
}

impl FileCursorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, sensor: &str) -> PathBuf {
        self.root.join(format!("{sensor}.cursor.json"))
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self, sensor: &str) -> Result<Snapshot, ExecError> {
        let path = self.path_for(sensor);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Snapshot::from_cursor(&s)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Snapshot::new()),
            Err(e) => Err(CoreError::Cursor(format!("read {}: {e}", path.display())).into()),
        }
    }

    fn save(&self, sensor: &str, snapshot: &Snapshot) -> Result<(), ExecError> {
        let cursor = snapshot.to_cursor()?;
        fs::create_dir_all(&self.root)
            .map_err(|e| CoreError::Cursor(format!("mkdir {}: {e}", self.root.display())))?;

        let path = self.path_for(sensor);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, cursor)
            .map_err(|e| CoreError::Cursor(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| CoreError::Cursor(format!("rename {}: {e}", path.display())))?;
        Ok(())
    }
}

/// Cursor strings kept in memory; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursorStore {
    cursors: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursors(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored cursor text, exactly as persisted.
    pub fn raw(&self, sensor: &str) -> Option<String> {
        self.cursors().get(sensor).cloned()
    }

    pub fn put_raw(&self, sensor: &str, cursor: impl Into<String>) {
        self.cursors().insert(sensor.to_string(), cursor.into());
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self, sensor: &str) -> Result<Snapshot, ExecError> {
        match self.raw(sensor) {
            Some(s) => Ok(Snapshot::from_cursor(&s)?),
            None => Ok(Snapshot::new()),
        }
    }

    fn save(&self, sensor: &str, snapshot: &Snapshot) -> Result<(), ExecError> {
        let cursor = snapshot.to_cursor()?;
        self.put_raw(sensor, cursor);
        Ok(())
    }
}
