use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cabflow_core::config::normalize_extension;
use cabflow_core::error::{Error, Result};
use cabflow_core::snapshot::ModTime;

use super::{FileEntry, RequestSource};

/// Local directory, listed non-recursively.
#[derive(Debug, Clone)]
pub struct FsRequestSource {
    dir: PathBuf,
    extension: String,
}

impl FsRequestSource {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: normalize_extension(extension),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn watches(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    fn access_error(&self, e: std::io::Error) -> Error {
        Error::DirectoryAccess {
            path: self.dir.display().to_string(),
            reason: e.to_string(),
        }
    }
}

impl RequestSource for FsRequestSource {
    fn describe(&self) -> String {
        format!("{}/*.{}", self.dir.display(), self.extension)
    }

    fn list(&self) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let rd = fs::read_dir(&self.dir).map_err(|e| self.access_error(e))?;

        for entry in rd {
            let entry = entry.map_err(|e| self.access_error(e))?;
            let path = entry.path();
            if !self.watches(&path) {
                continue;
            }
            // Names go into the cursor verbatim; skip what cannot be keyed.
            let Ok(name) = entry.file_name().into_string() else {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path.display(), "skipping non-UTF-8 file name");
                continue;
            };
            let meta = match fs::metadata(&path) {
                Ok(m) => m,
                // Removed between readdir and stat: treat as already deleted.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::FileRead {
                        file: name,
                        reason: format!("metadata: {e}"),
                    })
                }
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().map_err(|e| Error::FileRead {
                file: name.clone(),
                reason: format!("mtime: {e}"),
            })?;
            entries.push(FileEntry::new(name, ModTime::from_system_time(modified)));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.dir.join(name)).map_err(|e| Error::FileRead {
            file: name.to_string(),
            reason: e.to_string(),
        })
    }
}
