#![forbid(unsafe_code)]
//! cabflow-sensor: detect new or changed request files and turn each one into
//! a deduplicated trigger.
//!
//! - `source`: where listings and file contents come from (filesystem, memory).
//! - `parse`: request payload parsers (JSON, YAML).
//! - `poller`: compare-and-snapshot over a source and a previous `Snapshot`.
//!
//! Nothing here persists state; the caller owns the snapshot between polls.

pub mod parse;
pub mod poller;
pub mod source;

pub use parse::{parser_for_extension, JsonParser, RequestParser, YamlParser};
pub use poller::{poll, PollOutcome, Poller};
pub use source::{
    build_source_from_config, FileEntry, FsRequestSource, MemoryRequestSource, RequestSource,
};
