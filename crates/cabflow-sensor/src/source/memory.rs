//! In-memory request directory for testing.
//!
//! Files carry explicit modification times so tests can script exact
//! "unchanged", "touched", and "deleted" sequences without sleeping.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cabflow_core::config::normalize_extension;
use cabflow_core::error::{Error, Result};
use cabflow_core::snapshot::ModTime;

use super::{FileEntry, RequestSource};

#[derive(Debug, Default)]
struct Dir {
    files: BTreeMap<String, (ModTime, Vec<u8>)>,
    missing: bool,
}

/// Thread-safe in-memory directory; clones share the same files.
#[derive(Debug, Clone)]
pub struct MemoryRequestSource {
    dir: Arc<Mutex<Dir>>,
    extension: String,
}

impl MemoryRequestSource {
    pub fn new() -> Self {
        Self::with_extension("json")
    }

    pub fn with_extension(extension: &str) -> Self {
        Self {
            dir: Arc::new(Mutex::new(Dir::default())),
            extension: normalize_extension(extension),
        }
    }

    fn dir(&self) -> MutexGuard<'_, Dir> {
        self.dir.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a file.
    pub fn insert(&self, name: impl Into<String>, mtime: impl Into<ModTime>, bytes: impl Into<Vec<u8>>) {
        self.dir()
            .files
            .insert(name.into(), (mtime.into(), bytes.into()));
    }

    /// Change a file's mtime without changing its contents. Returns false if absent.
    pub fn touch(&self, name: &str, mtime: impl Into<ModTime>) -> bool {
        match self.dir().files.get_mut(name) {
            Some(entry) => {
                entry.0 = mtime.into();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, name: &str) -> bool {
        self.dir().files.remove(name).is_some()
    }

    /// Make listings fail as if the directory had been removed.
    pub fn set_missing(&self, missing: bool) {
        self.dir().missing = missing;
    }

    pub fn len(&self) -> usize {
        self.dir().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.dir().files.clear();
    }

    fn watches(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.extension)
    }
}

impl Default for MemoryRequestSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSource for MemoryRequestSource {
    fn describe(&self) -> String {
        format!("memory://*.{}", self.extension)
    }

    fn list(&self) -> Result<Vec<FileEntry>> {
        let dir = self.dir();
        if dir.missing {
            return Err(Error::DirectoryAccess {
                path: "memory://".into(),
                reason: "directory does not exist".into(),
            });
        }
        Ok(dir
            .files
            .iter()
            .filter(|(name, _)| self.watches(name))
            .map(|(name, (mtime, _))| FileEntry::new(name.clone(), *mtime))
            .collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.dir()
            .files
            .get(name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::FileRead {
                file: name.to_string(),
                reason: "not found".into(),
            })
    }
}
