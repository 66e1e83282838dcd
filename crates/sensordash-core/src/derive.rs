//! Turning a raw snapshot field into the value shown and charted.
//!
//! Raw altitude gets [`ALTITUDE_OFFSET`] added, identically on the card and
//! the chart path. Every other metric is passed through untouched.

use chrono::{DateTime, Utc};

use crate::metric::Metric;
use crate::snapshot::Snapshot;
use crate::window::RollingWindow;

/// Constant added to raw altitude (1324 + 836).
pub const ALTITUDE_OFFSET: f64 = 1324.0 + 836.0;

/// Display value of `metric` for `snapshot`, with the altitude correction.
pub fn corrected_value(snapshot: &Snapshot, metric: Metric) -> f64 {
    correct(metric, snapshot.get(metric))
}

/// Apply the per-metric correction to a raw reading.
pub fn correct(metric: Metric, raw: f64) -> f64 {
    match metric {
        Metric::Altitude => raw + ALTITUDE_OFFSET,
        _ => raw,
    }
}

/// Outcome of deriving one snapshot for the active metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub metric: Metric,
    /// Field value as received.
    pub raw: f64,
    /// Corrected value, appended to the window and shown on the card.
    pub value: f64,
    pub at: DateTime<Utc>,
}

/// Derive the charted value for `active` and append it to `window`.
pub fn on_snapshot(
    snapshot: &Snapshot,
    active: Metric,
    at: DateTime<Utc>,
    window: &mut RollingWindow,
) -> Derived {
    let raw = snapshot.get(active);
    let value = correct(active, raw);
    window.append(at, value);
    Derived {
        metric: active,
        raw,
        value,
        at,
    }
}
