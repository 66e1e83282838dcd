//! Full sensor snapshots and the store holding the latest one.

use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// One complete set of sensor readings as pushed by the upstream source.
///
/// Every field defaults to zero, so a payload that omits a field reads as 0
/// rather than failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub altitude: f64,
}

impl Snapshot {
    /// Raw (uncorrected) value of one metric.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temp => self.temp,
            Metric::Humidity => self.humidity,
            Metric::Pressure => self.pressure,
            Metric::X => self.x,
            Metric::Y => self.y,
            Metric::Z => self.z,
            Metric::Altitude => self.altitude,
        }
    }

    /// Decode a snapshot from an arbitrary JSON value.
    pub fn from_json(value: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }
}

/// Holds the most recently received snapshot. Overwritten, never merged.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Snapshot,
    received: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot wholesale.
    pub fn set(&mut self, snapshot: Snapshot) {
        self.current = snapshot;
        self.received += 1;
    }

    /// Latest snapshot, or the all-zero default before any data arrived.
    pub fn get(&self) -> &Snapshot {
        &self.current
    }

    /// Number of snapshots stored so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn has_data(&self) -> bool {
        self.received > 0
    }
}
