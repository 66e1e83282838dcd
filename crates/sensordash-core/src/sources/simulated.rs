//! Synthetic sensor readings: a mean-reverting random walk per field.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sleep_cancellable;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::source::{
    DEFAULT_PATH, PushSource, SnapshotSink, SourceInfo, SourceKind, Subscription, spawn_worker,
};

/// Pull toward the baseline applied every step.
const REVERSION: f64 = 0.05;

const BASELINE: Snapshot = Snapshot {
    temp: 22.0,
    humidity: 45.0,
    pressure: 101_325.0,
    x: 0.0,
    y: 0.0,
    z: 9.81,
    altitude: 35.0,
};

const STEP: Snapshot = Snapshot {
    temp: 0.15,
    humidity: 0.5,
    pressure: 8.0,
    x: 0.05,
    y: 0.05,
    z: 0.05,
    altitude: 0.3,
};

/// Random-walk generator behind [`SimulatedSource`].
pub struct Walker {
    rng: StdRng,
    current: Snapshot,
}

impl Walker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            current: BASELINE,
        }
    }

    pub fn next_snapshot(&mut self) -> Snapshot {
        let c = &mut self.current;
        let rng = &mut self.rng;
        let mut walk = |value: &mut f64, base: f64, step: f64| {
            let delta = rng.random_range(-step..=step);
            *value += delta + (base - *value) * REVERSION;
            *value = (*value * 100.0).round() / 100.0;
        };
        walk(&mut c.temp, BASELINE.temp, STEP.temp);
        walk(&mut c.humidity, BASELINE.humidity, STEP.humidity);
        walk(&mut c.pressure, BASELINE.pressure, STEP.pressure);
        walk(&mut c.x, BASELINE.x, STEP.x);
        walk(&mut c.y, BASELINE.y, STEP.y);
        walk(&mut c.z, BASELINE.z, STEP.z);
        walk(&mut c.altitude, BASELINE.altitude, STEP.altitude);
        c.humidity = c.humidity.clamp(0.0, 100.0);
        *c
    }
}

pub struct SimulatedSource {
    info: SourceInfo,
    interval: Duration,
    seed: Option<u64>,
}

impl SimulatedSource {
    pub fn new(interval: Duration, seed: Option<u64>) -> Self {
        Self {
            info: SourceInfo {
                name: "simulate".to_string(),
                kind: SourceKind::Simulated,
                path: DEFAULT_PATH.to_string(),
                origin: match seed {
                    Some(s) => format!("random walk (seed {s})"),
                    None => "random walk".to_string(),
                },
            },
            interval,
            seed,
        }
    }
}

impl PushSource for SimulatedSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription> {
        let mut walker = Walker::new(self.seed);
        let interval = self.interval;
        let token = sink.token();
        let worker = spawn_worker("simulate", move || {
            let token = sink.token();
            while sink.deliver(walker.next_snapshot()) {
                if !sleep_cancellable(&token, interval) {
                    return;
                }
            }
        })?;
        Ok(Subscription::new(token).with_worker(worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CancelToken;
    use std::sync::mpsc;

    #[test]
    fn seeded_walks_are_reproducible() {
        let mut a = Walker::new(Some(7));
        let mut b = Walker::new(Some(7));
        for _ in 0..50 {
            assert_eq!(a.next_snapshot(), b.next_snapshot());
        }
    }

    #[test]
    fn walk_stays_near_baseline() {
        let mut w = Walker::new(Some(42));
        for _ in 0..2_000 {
            let s = w.next_snapshot();
            assert!((s.temp - BASELINE.temp).abs() < 5.0, "temp drifted: {}", s.temp);
            assert!((0.0..=100.0).contains(&s.humidity));
            assert!((s.pressure - BASELINE.pressure).abs() < 500.0);
        }
    }

    #[test]
    fn cancel_stops_the_worker() {
        let mut source = SimulatedSource::new(Duration::from_millis(1), Some(1));
        let (tx, rx) = mpsc::channel();
        let mut sub = source
            .subscribe(SnapshotSink::new(tx, CancelToken::new()))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        sub.cancel();
        // Drains whatever was in flight, then the worker drops its sender.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while rx.recv_timeout(Duration::from_millis(50)).is_ok() {
            assert!(std::time::Instant::now() < deadline);
        }
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(200)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }
}
