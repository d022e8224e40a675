//! Run sinks: where triggers go once a tick has produced them.
//!
//! The downstream job system deduplicates by `run_key`, so a sink may see the
//! same request twice when a tick fails after submitting but before its
//! cursor was saved.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cabflow_core::id::{JobName, RunKey};
use cabflow_core::trigger::Trigger;

use crate::ExecError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub job: JobName,
    pub run_key: RunKey,
    pub run_config: Value,
}

impl RunRequest {
    pub fn from_trigger(job: &JobName, op: &str, trigger: &Trigger) -> Self {
        Self {
            job: job.clone(),
            run_key: trigger.run_key.clone(),
            run_config: trigger.run_config(op),
        }
    }
}

pub trait RunSink {
    fn submit(&mut self, request: &RunRequest) -> Result<(), ExecError>;
}

impl<T: RunSink + ?Sized> RunSink for &mut T {
    fn submit(&mut self, request: &RunRequest) -> Result<(), ExecError> {
        (**self).submit(request)
    }
}

/// Appends one JSON object per request, flushing after each line.
pub struct JsonlRunSink<W: Write> {
    writer: BufWriter<W>,
}

impl JsonlRunSink<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self, ExecError> {
        let path = path.as_ref();
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ExecError::Sink(format!("open {}: {e}", path.display())))?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlRunSink<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }
}

impl<W: Write> RunSink for JsonlRunSink<W> {
    fn submit(&mut self, request: &RunRequest) -> Result<(), ExecError> {
        let line = serde_json::to_string(request).map_err(|e| ExecError::Sink(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(|e| ExecError::Sink(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| ExecError::Sink(e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub requests: Vec<RunRequest>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_keys(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.run_key.as_str()).collect()
    }
}

impl RunSink for CollectingSink {
    fn submit(&mut self, request: &RunRequest) -> Result<(), ExecError> {
        self.requests.push(request.clone());
        Ok(())
    }
}
