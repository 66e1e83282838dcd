//! Replays a JSON-lines recording, one snapshot per line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::sleep_cancellable;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::source::{
    DEFAULT_PATH, PushSource, SnapshotSink, SourceInfo, SourceKind, Subscription, spawn_worker,
};

pub struct ReplaySource {
    info: SourceInfo,
    file: PathBuf,
    interval: Duration,
    repeat: bool,
}

impl ReplaySource {
    pub fn new(file: impl AsRef<Path>, interval: Duration, repeat: bool) -> Self {
        let file = file.as_ref().to_path_buf();
        Self {
            info: SourceInfo {
                name: "replay".to_string(),
                kind: SourceKind::Replay,
                path: DEFAULT_PATH.to_string(),
                origin: file.display().to_string(),
            },
            file,
            interval,
            repeat,
        }
    }
}

/// Parse JSON lines into snapshots. Blank lines are skipped; lines that do not
/// decode are logged and skipped.
pub fn parse_lines(text: &str) -> Vec<Snapshot> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<Snapshot>(line) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("replay: skipping line {}: {e}", i + 1);
                None
            }
        })
        .collect()
}

impl PushSource for ReplaySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription> {
        let text = std::fs::read_to_string(&self.file)?;
        let snapshots = parse_lines(&text);
        log::info!(
            "replay: {} snapshots from {}",
            snapshots.len(),
            self.file.display()
        );

        let interval = self.interval;
        let repeat = self.repeat;
        let token = sink.token();
        let worker = spawn_worker("replay", move || {
            let token = sink.token();
            loop {
                for snapshot in &snapshots {
                    if !sink.deliver(*snapshot) || !sleep_cancellable(&token, interval) {
                        return;
                    }
                }
                if !repeat || snapshots.is_empty() {
                    return;
                }
            }
        })?;
        Ok(Subscription::new(token).with_worker(worker))
    }
}
