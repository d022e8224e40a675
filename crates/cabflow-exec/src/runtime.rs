//! Runtime: evaluate registered sensors and persist their cursors.
//!
//! Per tick:
//! - load the sensor's cursor (empty on first run),
//! - poll its request directory,
//! - submit one `RunRequest` per trigger to the sink,
//! - persist the next cursor and return a `TickManifest`.
//!
//! Anything failing before the last step leaves the stored cursor as it was.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use cabflow_core::manifest::{TickManifest, TickStats};
use cabflow_sensor::{build_source_from_config, parser_for_extension, Poller, RequestParser, RequestSource};

use crate::cursor::CursorStore;
use crate::metrics;
use crate::registry::{SensorDef, SensorRegistry};
use crate::replay::{hash_cursor, hash_run_keys};
use crate::sink::{RunRequest, RunSink};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] cabflow_core::Error),
    #[error("sensor registry: {0}")]
    Registry(String),
    #[error("sensor definitions: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),
    #[error("run sink: {0}")]
    Sink(String),
}

type BoxedPoller = Poller<Box<dyn RequestSource>, Box<dyn RequestParser>>;

struct Armed {
    def: SensorDef,
    poller: BoxedPoller,
}

/// Result of evaluating one sensor during a round.
#[derive(Debug)]
pub struct SensorTick {
    pub sensor: String,
    pub result: Result<TickManifest, ExecError>,
}

/// Owns the registry's pollers and a cursor store. Holds no cursor state of
/// its own; only evaluation pacing (`last_attempt`) lives in memory.
pub struct SensorDaemon<C: CursorStore> {
    sensors: BTreeMap<String, Armed>,
    cursors: C,
    last_attempt: HashMap<String, Instant>,
}

impl<C: CursorStore> SensorDaemon<C> {
    pub fn new(registry: &SensorRegistry, cursors: C) -> Result<Self, ExecError> {
        let mut sensors = BTreeMap::new();
        for def in registry.iter() {
            let source = build_source_from_config(&def.config)?;
            let parser = parser_for_extension(&def.config.extension)?;
            let poller = Poller::new(source, parser, def.config.run_key_prefix.clone());
            sensors.insert(
                def.name.clone(),
                Armed {
                    def: def.clone(),
                    poller,
                },
            );
        }
        Ok(Self {
            sensors,
            cursors,
            last_attempt: HashMap::new(),
        })
    }

    /// Swap the request source of a registered sensor (tests, embedding callers).
    pub fn replace_source(
        &mut self,
        sensor: &str,
        source: Box<dyn RequestSource>,
    ) -> Result<(), ExecError> {
        let armed = self
            .sensors
            .get_mut(sensor)
            .ok_or_else(|| ExecError::UnknownSensor(sensor.to_string()))?;
        let parser = parser_for_extension(&armed.def.config.extension)?;
        armed.poller = Poller::new(source, parser, armed.def.config.run_key_prefix.clone());
        Ok(())
    }

    pub fn cursors(&self) -> &C {
        &self.cursors
    }

    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Evaluate one sensor once.
    pub fn tick(&self, sensor: &str, sink: &mut dyn RunSink) -> Result<TickManifest, ExecError> {
        let armed = self
            .sensors
            .get(sensor)
            .ok_or_else(|| ExecError::UnknownSensor(sensor.to_string()))?;

        let started = now_ms();
        let previous = self.cursors.load(sensor)?;
        let manifest = TickManifest::new(sensor, hash_cursor(&previous)?, started);

        let outcome = armed.poller.poll(&previous)?;
        for trigger in &outcome.triggers {
            let request = RunRequest::from_trigger(&armed.def.job, &armed.def.op, trigger);
            sink.submit(&request)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(sensor, job = %armed.def.job, run_key = %request.run_key, "submitted run request");
        }
        self.cursors.save(sensor, &outcome.next_snapshot)?;

        let stats = TickStats {
            trigger_count: outcome.triggers.len(),
            tracked_files: outcome.next_snapshot.len(),
        };
        let manifest = manifest.finish(
            hash_cursor(&outcome.next_snapshot)?,
            hash_run_keys(&outcome.triggers)?,
            stats,
            now_ms(),
        );
        metrics::emit_tick(&manifest);
        Ok(manifest)
    }

    /// Evaluate every sensor in name order. A failing sensor does not stop the others.
    pub fn tick_all(&mut self, sink: &mut dyn RunSink) -> Vec<SensorTick> {
        let names: Vec<String> = self.sensors.keys().cloned().collect();
        names
            .into_iter()
            .map(|name| self.tick_tracked(name, sink))
            .collect()
    }

    /// Like `tick_all`, but skips sensors evaluated less than their
    /// `min_interval_secs` ago.
    pub fn tick_due(&mut self, sink: &mut dyn RunSink) -> Vec<SensorTick> {
        let now = Instant::now();
        let due: Vec<String> = self
            .sensors
            .values()
            .filter(|a| match self.last_attempt.get(&a.def.name) {
                Some(last) => {
                    now.duration_since(*last) >= Duration::from_secs(a.def.config.min_interval_secs)
                }
                None => true,
            })
            .map(|a| a.def.name.clone())
            .collect();
        due.into_iter()
            .map(|name| self.tick_tracked(name, sink))
            .collect()
    }

    /// Serialized evaluation loop: one `tick_due` round per `interval`.
    /// Runs forever when `max_ticks` is `None`.
    pub fn run_loop(
        &mut self,
        interval: Duration,
        max_ticks: Option<usize>,
        sink: &mut dyn RunSink,
        mut on_round: impl FnMut(&[SensorTick]),
    ) {
        let mut round = 0usize;
        loop {
            let ticks = self.tick_due(sink);
            on_round(&ticks);
            round += 1;
            if max_ticks.is_some_and(|max| round >= max) {
                break;
            }
            std::thread::sleep(interval);
        }
    }

    fn tick_tracked(&mut self, name: String, sink: &mut dyn RunSink) -> SensorTick {
        self.last_attempt.insert(name.clone(), Instant::now());
        let result = self.tick(&name, sink);
        if let Err(e) = &result {
            metrics::emit_tick_failure(&name, e);
        }
        SensorTick {
            sensor: name,
            result,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
