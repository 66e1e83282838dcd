//! CLI for sensordash — live sensor cards and a rolling chart in your terminal.

mod commands;
mod tui;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "sensordash")]
#[command(about = "sensordash — live sensor telemetry dashboard")]
#[command(version = sensordash_core::VERSION)]
struct Cli {
    /// Write logs to this file instead of stderr (the monitor logs nothing otherwise)
    #[arg(long, global = true, env = "SENSORDASH_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live interactive dashboard (TUI): sensor cards plus a rolling chart
    Monitor {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric charted at startup
        #[arg(long, default_value = "temp")]
        metric: String,

        /// Start with the chart shown
        #[arg(long)]
        chart: bool,
    },

    /// Print one line per snapshot (headless)
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Metric reported as the derived value
        #[arg(long, default_value = "temp")]
        metric: String,

        /// Stop after N snapshots (default: run until Ctrl-C)
        #[arg(long)]
        count: Option<u64>,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// List chartable metrics with their labels and units
    Metrics,
}

/// Set up `env_logger`. `RUST_LOG` overrides `default_level`.
fn init_logging(default_level: &str, log_file: Option<&Path>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}: {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
        }
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    let log_file = cli.log_file.as_deref();

    let result = match cli.command {
        Commands::Monitor {
            source,
            metric,
            chart,
        } => {
            // Log lines on stderr would tear the TUI.
            let level = if log_file.is_some() { "info" } else { "off" };
            init_logging(level, log_file);
            commands::monitor::run(&source, &metric, chart)
        }
        Commands::Watch {
            source,
            metric,
            count,
            json,
        } => {
            init_logging("info", log_file);
            commands::watch::run(&source, &metric, count, json)
        }
        Commands::Metrics => {
            commands::metrics::run();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
