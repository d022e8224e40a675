//! Request sources implementing `RequestSource`.
//!
//! - `fs`: a directory on the local filesystem (default).
//! - `memory`: an in-memory directory with explicit modification times, used
//!   by tests and by callers that stage requests without touching disk.
//!
//! `build_source_from_config` chooses the backend from the configured
//! directory URI (e.g. `data/requests`, `file:///srv/requests`, `memory://`).

mod fs;
pub use fs::FsRequestSource;

mod memory;
pub use memory::MemoryRequestSource;

use cabflow_core::config::{normalize_extension, SensorConfig};
use cabflow_core::error::{Error, Result};
use cabflow_core::snapshot::ModTime;

/// One watched file as seen by a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub mtime: ModTime,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, mtime: ModTime) -> Self {
        Self {
            name: name.into(),
            mtime,
        }
    }
}

/// A watched directory. Sources only read; they never modify or delete files.
pub trait RequestSource {
    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;

    /// Every file carrying the watched extension, with its current mtime.
    fn list(&self) -> Result<Vec<FileEntry>>;

    /// Full contents of the file `name` from the last listing.
    fn read(&self, name: &str) -> Result<Vec<u8>>;
}

impl<T: RequestSource + ?Sized> RequestSource for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn list(&self) -> Result<Vec<FileEntry>> {
        (**self).list()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        (**self).read(name)
    }
}

/// Build the correct source backend using the provided configuration.
pub fn build_source_from_config(cfg: &SensorConfig) -> Result<Box<dyn RequestSource>> {
    if normalize_extension(&cfg.extension).is_empty() {
        return Err(Error::Config("watched extension must not be empty".into()));
    }
    match cfg.scheme() {
        Some("file") | None => Ok(Box::new(FsRequestSource::new(
            cfg.directory_path(),
            &cfg.extension,
        ))),
        Some("memory") => Ok(Box::new(MemoryRequestSource::with_extension(
            &cfg.extension,
        ))),
        Some(other) => Err(Error::Config(format!(
            "unsupported request directory scheme '{other}'"
        ))),
    }
}
