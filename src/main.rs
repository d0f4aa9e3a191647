//! Strain Sensor Agent CLI
//!
//! Scores ergonomic strain from a wearable's serial output in real time.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strain_sensor_agent::{
    config::Config,
    core::{decode_line, CalibrationState, Engine, StreamSummary, TickReport},
    publish::{SnapshotHub, SnapshotPublisher},
    runner::{RunEnd, Runner},
    source::{LineReader, LineReaderConfig, LineSource},
    stats::{create_shared_log_with_persistence, SessionStats},
    VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strain-sensor")]
#[command(version = VERSION)]
#[command(about = "Real-time ergonomic strain scoring for wearable sensors", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read sensor lines and score them until the source closes or Ctrl+C
    Start {
        /// Serial device, captured log file, or `-` for stdin
        #[arg(default_value = "-")]
        source: String,

        /// Delay between lines when replaying a captured log (milliseconds)
        #[arg(long)]
        pace_ms: Option<u64>,

        /// Override the tick interval (milliseconds)
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Print each snapshot as a JSON line instead of the status display
        #[arg(long)]
        json: bool,

        /// Print nothing per tick
        #[arg(long, conflicts_with = "json")]
        quiet: bool,

        /// Serve snapshots to subscribers over HTTP/WebSocket
        #[cfg(feature = "server")]
        #[arg(long)]
        serve: bool,

        /// Port for --serve (overrides the configured port)
        #[cfg(feature = "server")]
        #[arg(long)]
        port: Option<u16>,

        /// Bind the server on all interfaces instead of loopback
        #[cfg(feature = "server")]
        #[arg(long)]
        public: bool,
    },

    /// Decode lines from stdin and print what the agent would see
    Decode,

    /// Show statistics of the last session
    Status,

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            source,
            pace_ms,
            tick_ms,
            json,
            quiet,
            #[cfg(feature = "server")]
            serve,
            #[cfg(feature = "server")]
            port,
            #[cfg(feature = "server")]
            public,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(ms) = tick_ms {
                config.tick_interval = Duration::from_millis(ms);
            }
            #[cfg(feature = "server")]
            if let Some(port) = port {
                config.server_port = port;
            }
            config.validate()?;

            let output = if json {
                Output::Json
            } else if quiet {
                Output::Quiet
            } else {
                Output::Status
            };

            let options = StartOptions {
                source: LineSource::from_arg(&source),
                pace: pace_ms.map(Duration::from_millis),
                output,
                #[cfg(feature = "server")]
                serve,
                #[cfg(feature = "server")]
                public,
            };
            cmd_start(config, options)
        }
        Commands::Decode => cmd_decode(),
        Commands::Status => cmd_status(cli.config.as_ref()),
        Commands::Config { write_default } => cmd_config(cli.config.as_ref(), write_default),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Status,
    Json,
    Quiet,
}

struct StartOptions {
    source: LineSource,
    pace: Option<Duration>,
    output: Output,
    #[cfg(feature = "server")]
    serve: bool,
    #[cfg(feature = "server")]
    public: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().context("loading configuration")?,
    };
    Ok(config)
}

fn cmd_start(config: Config, options: StartOptions) -> anyhow::Result<()> {
    let session_id = uuid::Uuid::new_v4().to_string();

    eprintln!("Strain Sensor Agent v{VERSION}");
    eprintln!("  Source: {}", options.source);
    eprintln!("  Tick interval: {}ms", config.tick_interval.as_millis());
    eprintln!("  Rolling window: {} ticks", config.window_ticks);
    eprintln!(
        "  Calibration: first {}s",
        config.calibration.duration.as_secs()
    );
    eprintln!("  Session ID: {session_id}");
    eprintln!();

    let session_log = create_shared_log_with_persistence(config.stats_path());
    let hub = SnapshotHub::default();
    let publisher = SnapshotPublisher::with_sink(Arc::new(hub.clone()));

    // The runtime only hosts the subscriber server; scoring stays on this thread.
    #[cfg(feature = "server")]
    let server = if options.serve {
        let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
        let server_config = strain_sensor_agent::server::ServerConfig {
            port: config.server_port,
            public: options.public,
        };
        let (addr, shutdown) = runtime
            .block_on(strain_sensor_agent::server::run(
                server_config,
                hub.clone(),
                session_id.clone(),
            ))
            .context("starting snapshot server")?;
        eprintln!("Serving snapshots on ws://{addr}/ws");
        Some((runtime, shutdown))
    } else {
        None
    };

    let mut reader = LineReader::new(LineReaderConfig {
        source: options.source,
        pace: options.pace,
        ..LineReaderConfig::default()
    });
    reader.start()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;

    let engine = Engine::new(&config, Utc::now())?;
    let mut runner = Runner::new(
        engine,
        config.tick_interval,
        publisher,
        session_log.clone(),
    );

    let output = options.output;
    let end = runner.run(reader.receiver(), &running, |report| {
        if let Some(baseline) = report.baseline_resolved {
            eprintln!(
                "Baseline set → press≈{:.1}{}",
                baseline.light_press,
                if baseline.used_default {
                    " (default, too few samples)"
                } else {
                    ""
                }
            );
        }
        match output {
            Output::Status => print_status(report),
            Output::Json => match serde_json::to_string(&report.snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!("Failed to serialize snapshot: {e}"),
            },
            Output::Quiet => {}
        }
    });

    reader.stop();

    #[cfg(feature = "server")]
    if let Some((runtime, shutdown)) = server {
        let _ = shutdown.send(());
        runtime.shutdown_timeout(Duration::from_secs(1));
    }

    eprintln!();
    match end {
        RunEnd::Stopped => eprintln!("Stopped."),
        RunEnd::SourceClosed => eprintln!("Source closed."),
    }

    if let Err(e) = session_log.save() {
        eprintln!("Warning: Could not save session statistics: {e}");
    }

    eprintln!();
    eprintln!("{}", session_log.summary());
    match runner.engine().calibration() {
        CalibrationState::Resolved(baseline) => {
            eprintln!("  Baseline light press: {:.1}", baseline.light_press)
        }
        CalibrationState::Collecting { count, .. } => eprintln!(
            "  Baseline light press: not resolved ({count} samples, session shorter than calibration)"
        ),
    }

    Ok(())
}

fn print_status(report: &TickReport) {
    let snapshot = &report.snapshot;
    println!(
        "[{}] [Risk {}]  press:{:.0}  tilt:{:.0}({})  acc:{:.1}",
        report.at.format("%H:%M:%S"),
        snapshot.risk,
        snapshot.pressure,
        snapshot.tilt,
        report.posture.label(),
        report.motion
    );
    println!(
        "    heavy:{}  sideways:{}  static:{}s  bursts:{}  sinceBreak:{:.1}m",
        pct(report.features.heavy_press_pct),
        pct(report.features.extreme_tilt_pct),
        snapshot.static_hold_streak_sec,
        report.features.burst_count,
        snapshot.minutes_since_break
    );
    let streams = &report.streams;
    if streams.pressure.is_some() || streams.tilt.is_some() {
        println!(
            "    window: press {}  tilt {}",
            stream_line(streams.pressure.as_ref()),
            stream_line(streams.tilt.as_ref())
        );
    }
    if !report.warnings.is_empty() {
        let warnings: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
        println!("    Warnings: • {}", warnings.join("  • "));
    }
}

fn stream_line(summary: Option<&StreamSummary>) -> String {
    match summary {
        Some(s) => format!(
            "μ{:.0} σ{:.1} [{:.0}..{:.0}] n={}",
            s.mean, s.std_dev, s.min, s.max, s.count
        ),
        None => "-".to_string(),
    }
}

fn pct(x: f64) -> String {
    format!("{}%", (x * 100.0).round())
}

fn cmd_decode() -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let (mut decoded, mut dropped) = (0u64, 0u64);

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match decode_line(&line) {
            Some((kind, value)) => {
                decoded += 1;
                println!("{kind:<10} {value}");
            }
            None => {
                dropped += 1;
                println!("dropped    {line:?}");
            }
        }
    }

    eprintln!("{decoded} decoded, {dropped} dropped");
    Ok(())
}

fn cmd_status(config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Strain Sensor Agent Status");
    println!("==========================");
    println!();

    let stats_path = config.stats_path();
    if !stats_path.exists() {
        println!("No previous session data found.");
        return Ok(());
    }

    let content = std::fs::read_to_string(&stats_path)
        .with_context(|| format!("reading {}", stats_path.display()))?;
    let stats: SessionStats = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", stats_path.display()))?;

    println!("Last session:");
    println!("  Started: {}", stats.session_start.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Duration: {}s", stats.session_duration_secs);
    println!("  Lines received: {}", stats.lines_received);
    println!(
        "  Lines dropped: {} ({:.1}%)",
        stats.lines_dropped,
        stats.drop_rate() * 100.0
    );
    println!("  Ticks: {}", stats.ticks);
    println!("  Snapshots delivered: {}", stats.snapshots_delivered);
    println!("  Warnings raised: {}", stats.warnings_raised);
    Ok(())
}

fn cmd_config(config_path: Option<&PathBuf>, write_default: bool) -> anyhow::Result<()> {
    let path = config_path.cloned().unwrap_or_else(Config::config_path);

    if write_default {
        Config::default()
            .save_to(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote default configuration to {path:?}");
        return Ok(());
    }

    let config = load_config(config_path)?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
