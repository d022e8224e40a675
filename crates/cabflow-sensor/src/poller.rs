//! Change-detection poller.
//!
//! One poll lists the watched directory, compares every file's mtime with the
//! previous snapshot, parses the files that are new or changed, and returns one
//! trigger per such file together with the next snapshot. A poll either
//! succeeds completely or fails without producing any triggers, so a caller
//! that only persists the snapshot on success can always retry from the last
//! good state.

use cabflow_core::error::{Error, Result};
use cabflow_core::snapshot::Snapshot;
use cabflow_core::trigger::Trigger;

use crate::parse::RequestParser;
use crate::source::RequestSource;

#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    /// One per new or changed file, in file-name order.
    pub triggers: Vec<Trigger>,
    /// Every watched file currently present, keyed by name.
    pub next_snapshot: Snapshot,
}

/// A source, a parser, and the run-key prefix of the sensor they belong to.
pub struct Poller<S, P> {
    source: S,
    parser: P,
    run_key_prefix: String,
}

impl<S: RequestSource, P: RequestParser> Poller<S, P> {
    pub fn new(source: S, parser: P, run_key_prefix: impl Into<String>) -> Self {
        Self {
            source,
            parser,
            run_key_prefix: run_key_prefix.into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn run_key_prefix(&self) -> &str {
        &self.run_key_prefix
    }

    pub fn poll(&self, previous: &Snapshot) -> Result<PollOutcome> {
        poll(&self.source, &self.parser, &self.run_key_prefix, previous)
    }
}

/// Compare the current directory state against `previous`.
pub fn poll<S, P>(source: &S, parser: &P, run_key_prefix: &str, previous: &Snapshot) -> Result<PollOutcome>
where
    S: RequestSource + ?Sized,
    P: RequestParser + ?Sized,
{
    let mut entries = source.list()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut triggers = Vec::new();
    for entry in &entries {
        if !previous.is_changed(&entry.name, entry.mtime) {
            continue;
        }
        let bytes = source.read(&entry.name)?;
        let content = parser.parse(&bytes).map_err(|reason| Error::ContentParse {
            file: entry.name.clone(),
            reason,
        })?;
        triggers.push(Trigger::new(run_key_prefix, &entry.name, entry.mtime, content));
    }

    let next_snapshot: Snapshot = entries.into_iter().map(|e| (e.name, e.mtime)).collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        source = %source.describe(),
        tracked = next_snapshot.len(),
        forgotten = previous.names().filter(|n| !next_snapshot.contains(n)).count(),
        triggers = triggers.len(),
        "polled request directory"
    );

    Ok(PollOutcome {
        triggers,
        next_snapshot,
    })
}
