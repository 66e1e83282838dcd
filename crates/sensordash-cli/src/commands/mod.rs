pub mod metrics;
pub mod monitor;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use sensordash_core::{
    DEFAULT_PATH, DashError, FirebaseSource, Metric, PushSource, ReplaySource, Result,
    SimulatedSource,
};
use sensordash_server::{DEFAULT_LISTEN, HttpIngestSource};

/// Source selection flags shared by `monitor` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Where snapshots come from
    #[arg(long, default_value = "simulate", value_parser = ["firebase", "http", "replay", "simulate"])]
    pub source: String,

    /// Firebase Realtime Database URL (firebase source)
    #[arg(long, env = "SENSORDASH_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Upstream path holding the snapshot (firebase and http sources)
    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// Listen address for the ingest server (http source)
    #[arg(long, default_value = DEFAULT_LISTEN, env = "SENSORDASH_LISTEN")]
    pub listen: String,

    /// JSON-lines recording to play back (replay source)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Seconds between snapshots (replay and simulate sources)
    #[arg(long, default_value = "1.0")]
    pub interval: f64,

    /// Loop the recording when it ends (replay source)
    #[arg(long)]
    pub repeat: bool,

    /// Seed for reproducible readings (simulate source)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SourceArgs {
    fn interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.interval)
            .map_err(|e| DashError::subscribe(&self.source, format!("bad --interval: {e}")))
    }
}

/// Build the push source named by `--source`.
pub fn make_source(args: &SourceArgs) -> Result<Box<dyn PushSource>> {
    let source: Box<dyn PushSource> = match args.source.as_str() {
        "firebase" => {
            let url = args.database_url.as_deref().ok_or_else(|| {
                DashError::subscribe(
                    "firebase",
                    "--database-url (or SENSORDASH_DATABASE_URL) is required",
                )
            })?;
            Box::new(FirebaseSource::new(url, Some(&args.path)))
        }
        "http" => Box::new(HttpIngestSource::new(&args.listen, Some(&args.path))),
        "replay" => {
            let file = args
                .file
                .as_ref()
                .ok_or_else(|| DashError::subscribe("replay", "--file is required"))?;
            Box::new(ReplaySource::new(file, args.interval()?, args.repeat))
        }
        "simulate" => Box::new(SimulatedSource::new(args.interval()?, args.seed)),
        other => {
            return Err(DashError::subscribe(other, "unknown source"));
        }
    };
    log::debug!("source: {} ({})", source.name(), source.info().origin);
    Ok(source)
}

/// Parse a metric id from the command line.
pub fn parse_metric(s: &str) -> Result<Metric> {
    s.trim().to_lowercase().parse()
}
