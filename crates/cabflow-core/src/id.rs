//! Strongly-typed names used across cabflow.
//!
//! Downstream crates (sensor, exec, cli) should *not* pass raw strings around
//! for run keys, job names, or asset keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::ModTime;

macro_rules! new_name {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(v: impl Into<String>) -> Self {
                Self(v.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }
    };
}

new_name!(RunKey);
new_name!(JobName);
new_name!(AssetKey);

impl RunKey {
    /// Dedup key for one observed version of a request file.
    ///
    /// Rendered as `{prefix}_{file_name}_{mtime}` with the shortest decimal
    /// form that round-trips the modification time, so the key is stable for
    /// a given `(file_name, mtime)` and changes whenever the mtime does.
    pub fn for_file(prefix: &str, file_name: &str, mtime: ModTime) -> Self {
        Self(format!("{prefix}_{file_name}_{mtime}"))
    }
}
