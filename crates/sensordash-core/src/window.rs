//! Bounded FIFO of recent samples for the charted metric.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of points kept in the chart window.
pub const WINDOW_SIZE: usize = 20;

/// One observation of the active metric at the moment a snapshot arrived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Ordered (oldest first) window of at most `capacity` sample points.
///
/// Appending to a full window evicts exactly the oldest point; the window is
/// only ever emptied by [`RollingWindow::clear`].
#[derive(Debug, Clone)]
pub struct RollingWindow {
    points: VecDeque<SamplePoint>,
    capacity: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingWindow {
    /// Window with the dashboard's fixed capacity of [`WINDOW_SIZE`].
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_SIZE)
    }

    /// Window with a custom capacity (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, timestamp: DateTime<Utc>, value: f64) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(SamplePoint { timestamp, value });
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Points in arrival order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &SamplePoint> + '_ {
        self.points.iter()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn latest(&self) -> Option<&SamplePoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
