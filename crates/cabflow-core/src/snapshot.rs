//! Modification-time snapshots and their cursor encoding.
//!
//! A `Snapshot` maps each watched file name to the modification time seen on
//! the last successful poll. It is the only state that survives between sensor
//! invocations; the caller persists it as a cursor string.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File modification time in (fractional) seconds since the Unix epoch.
///
/// Compared with exact equality: an mtime is an opaque version stamp, not an
/// approximate clock reading.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModTime(f64);

impl ModTime {
    pub const fn from_secs_f64(secs: f64) -> Self {
        Self(secs)
    }

    pub const fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Convert filesystem metadata time. Times before the epoch become negative.
    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_secs_f64()),
            Err(e) => Self(-e.duration().as_secs_f64()),
        }
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for ModTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `f64` Display is the shortest form that parses back to the same value.
        write!(f, "{}", self.0)
    }
}

impl From<f64> for ModTime {
    fn from(secs: f64) -> Self {
        Self(secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, ModTime>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ModTime> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Record `mtime` for `name`, replacing any earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, mtime: ModTime) {
        self.0.insert(name.into(), mtime);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in file-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ModTime> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True when `name` is unknown or was last seen with a different mtime.
    pub fn is_changed(&self, name: &str, mtime: ModTime) -> bool {
        self.get(name) != Some(mtime)
    }

    /// Serialize to the cursor wire format: a JSON object of name -> seconds.
    pub fn to_cursor(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a cursor produced by [`Snapshot::to_cursor`].
    ///
    /// An empty cursor is a first run and yields an empty snapshot.
    pub fn from_cursor(cursor: &str) -> Result<Self> {
        let cursor = cursor.trim();
        if cursor.is_empty() {
            return Ok(Self::new());
        }
        let snap: Snapshot = serde_json::from_str(cursor)?;
        if let Some((name, mtime)) = snap.iter().find(|(_, m)| !m.is_finite()) {
            return Err(Error::Cursor(format!(
                "non-finite modification time {mtime} for '{name}'"
            )));
        }
        Ok(snap)
    }
}

impl FromIterator<(String, ModTime)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ModTime)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a ModTime);
    type IntoIter = btree_map::Iter<'a, String, ModTime>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(entries: &[(&str, f64)]) -> Snapshot {
        entries
            .iter()
            .map(|(n, m)| (n.to_string(), ModTime::from_secs_f64(*m)))
            .collect()
    }

    #[test]
    fn cursor_uses_name_to_number_object() {
        let s = snap(&[("b.json", 1690000005.0), ("a.json", 1690000000.0)]);
        assert_eq!(
            s.to_cursor().unwrap(),
            r#"{"a.json":1690000000.0,"b.json":1690000005.0}"#
        );
    }

    #[test]
    fn cursor_round_trip_preserves_precision() {
        let s = snap(&[
            ("a.json", 1690000000.123456789),
            ("b.json", 1712345678.000001),
            ("c.json", 0.1 + 0.2),
        ]);
        let back = Snapshot::from_cursor(&s.to_cursor().unwrap()).unwrap();
        assert_eq!(back, s);
        for (name, mtime) in &s {
            assert_eq!(
                back.get(name).unwrap().as_secs_f64().to_bits(),
                mtime.as_secs_f64().to_bits()
            );
        }
    }

    #[test]
    fn empty_cursor_is_first_run() {
        assert!(Snapshot::from_cursor("").unwrap().is_empty());
        assert!(Snapshot::from_cursor("  \n").unwrap().is_empty());
        assert!(Snapshot::from_cursor("{}").unwrap().is_empty());
    }

    #[test]
    fn integer_mtimes_are_accepted() {
        let s = Snapshot::from_cursor(r#"{"req1.json": 100}"#).unwrap();
        assert_eq!(s.get("req1.json"), Some(ModTime::from_secs_f64(100.0)));
    }

    #[test]
    fn malformed_cursor_is_an_error() {
        let err = Snapshot::from_cursor("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Cursor(_)));
        assert!(Snapshot::from_cursor(r#"{"a.json": "soon"}"#).is_err());
    }

    #[test]
    fn change_detection_is_exact() {
        let s = snap(&[("a.json", 100.0)]);
        assert!(!s.is_changed("a.json", ModTime::from_secs_f64(100.0)));
        assert!(s.is_changed("a.json", ModTime::from_secs_f64(100.000001)));
        assert!(s.is_changed("b.json", ModTime::from_secs_f64(100.0)));
    }

    #[test]
    fn pre_epoch_times_are_negative() {
        let t = UNIX_EPOCH - std::time::Duration::from_secs(5);
        assert_eq!(ModTime::from_system_time(t).as_secs_f64(), -5.0);
    }
}
