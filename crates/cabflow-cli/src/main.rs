//! cabflow CLI: evaluate request sensors from a YAML definitions file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cabflow_core::config::DaemonConfig;
use cabflow_exec::{
    parse_yaml_sensors, CursorStore, DaemonOverrides, FileCursorStore, JsonlRunSink, RunSink,
    SensorDaemon, SensorTick,
};

#[derive(Parser)]
#[command(name = "cabflow")]
#[command(about = "Turn new or changed request files into deduplicated run requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate sensors once
    Tick {
        /// Path to the sensor definitions YAML file
        #[arg(short, long)]
        sensors: PathBuf,

        /// Cursor directory (overrides env and definitions file)
        #[arg(long)]
        state: Option<String>,

        /// Append run requests to this JSONL file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Evaluate only this sensor
        #[arg(long)]
        sensor: Option<String>,
    },

    /// Evaluate sensors repeatedly
    Watch {
        /// Path to the sensor definitions YAML file
        #[arg(short, long)]
        sensors: PathBuf,

        /// Cursor directory (overrides env and definitions file)
        #[arg(long)]
        state: Option<String>,

        /// Append run requests to this JSONL file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Seconds between rounds (overrides env and definitions file)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Stop after this many rounds
        #[arg(long)]
        max_ticks: Option<usize>,
    },

    /// Validate a sensor definitions file
    Validate {
        /// Path to the sensor definitions YAML file
        #[arg(short, long)]
        sensors: PathBuf,
    },

    /// Print the stored cursor of a sensor
    Cursor {
        /// Cursor directory
        #[arg(long)]
        state: Option<String>,

        /// Sensor name
        #[arg(long)]
        sensor: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tick {
            sensors,
            state,
            out,
            sensor,
        } => tick(&sensors, state, out, sensor),
        Commands::Watch {
            sensors,
            state,
            out,
            interval_secs,
            max_ticks,
        } => watch(&sensors, state, out, interval_secs, max_ticks),
        Commands::Validate { sensors } => validate(&sensors),
        Commands::Cursor { state, sensor } => show_cursor(state, &sensor),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Target directives match by prefix, so `cabflow` covers every workspace crate.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cabflow=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_daemon(
    sensors_path: &Path,
    state: Option<String>,
    interval_secs: Option<u64>,
) -> CliResult<(SensorDaemon<FileCursorStore>, DaemonConfig)> {
    let yaml = fs::read_to_string(sensors_path)
        .map_err(|e| format!("read {}: {e}", sensors_path.display()))?;
    let parsed = parse_yaml_sensors(&yaml)?;
    let config = resolve_daemon_config(&parsed.daemon, state, interval_secs);
    let daemon = SensorDaemon::new(&parsed.registry, FileCursorStore::new(&config.state_dir))?;
    Ok((daemon, config))
}

/// Env defaults, then the definitions file, then CLI flags.
fn resolve_daemon_config(
    overrides: &DaemonOverrides,
    state: Option<String>,
    interval_secs: Option<u64>,
) -> DaemonConfig {
    let mut config = DaemonConfig::from_env();
    overrides.apply(&mut config);
    if let Some(dir) = state {
        config.state_dir = dir;
    }
    if let Some(secs) = interval_secs {
        config.tick_interval_secs = secs;
    }
    config
}

fn open_sink(out: Option<PathBuf>) -> CliResult<Box<dyn RunSink>> {
    Ok(match out {
        Some(path) => Box::new(JsonlRunSink::to_path(path)?),
        None => Box::new(JsonlRunSink::to_writer(std::io::stdout())),
    })
}

fn tick(
    sensors_path: &Path,
    state: Option<String>,
    out: Option<PathBuf>,
    sensor: Option<String>,
) -> CliResult<()> {
    let (mut daemon, _) = load_daemon(sensors_path, state, None)?;
    let mut sink = open_sink(out)?;

    let ticks = match sensor {
        Some(name) => {
            let result = daemon.tick(&name, sink.as_mut());
            vec![SensorTick {
                sensor: name,
                result,
            }]
        }
        None => daemon.tick_all(sink.as_mut()),
    };

    report(&ticks);
    let failed = ticks.iter().filter(|t| t.result.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} sensor(s) failed; their cursors were not advanced").into());
    }
    Ok(())
}

fn watch(
    sensors_path: &Path,
    state: Option<String>,
    out: Option<PathBuf>,
    interval_secs: Option<u64>,
    max_ticks: Option<usize>,
) -> CliResult<()> {
    let (mut daemon, config) = load_daemon(sensors_path, state, interval_secs)?;
    let mut sink = open_sink(out)?;
    tracing::info!(
        state_dir = %config.state_dir,
        interval_secs = config.tick_interval_secs,
        sensors = daemon.sensor_names().count(),
        "watching request directories"
    );
    daemon.run_loop(
        Duration::from_secs(config.tick_interval_secs),
        max_ticks,
        sink.as_mut(),
        report,
    );
    Ok(())
}

fn report(ticks: &[SensorTick]) {
    let mut err = std::io::stderr().lock();
    for t in ticks {
        let _ = match &t.result {
            Ok(m) => writeln!(
                err,
                "✓ {}: {} run request(s), {} file(s) tracked, cursor {}",
                t.sensor,
                m.trigger_count,
                m.tracked_files,
                m.cursor_after.short()
            ),
            Err(e) => writeln!(err, "✗ {}: {}", t.sensor, e),
        };
    }
}

fn validate(sensors_path: &Path) -> CliResult<()> {
    let yaml = fs::read_to_string(sensors_path)
        .map_err(|e| format!("read {}: {e}", sensors_path.display()))?;
    let parsed = parse_yaml_sensors(&yaml)?;
    for def in parsed.registry.iter() {
        println!(
            "  {} -> {} (op {}) watching {}/*.{}",
            def.name, def.job, def.op, def.config.directory, def.config.extension
        );
    }
    println!("✓ {} sensor(s) valid", parsed.registry.len());
    Ok(())
}

fn show_cursor(state: Option<String>, sensor: &str) -> CliResult<()> {
    let config = resolve_daemon_config(&DaemonOverrides::default(), state, None);
    let store = FileCursorStore::new(&config.state_dir);
    let snapshot = store.load(sensor)?;
    let pretty = serde_json::to_string_pretty(&snapshot)?;
    println!("{pretty}");
    Ok(())
}
