//! Render-ready descriptions handed to the card and chart widgets.
//!
//! Nothing here draws; the TUI (or any other front end) consumes these plain
//! values and decides how they look.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::derive::corrected_value;
use crate::metric::Metric;
use crate::snapshot::Snapshot;
use crate::window::{RollingWindow, SamplePoint, WINDOW_SIZE};

/// Decimal places used for chart axis ticks.
pub const TICK_DECIMALS: usize = 2;

/// One labelled scalar readout on a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Readout {
    pub metric: Metric,
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

/// A card groups one or more readouts under a title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: &'static str,
    pub readouts: Vec<Readout>,
}

fn readout(snapshot: &Snapshot, metric: Metric, name: &'static str) -> Readout {
    Readout {
        metric,
        name,
        value: corrected_value(snapshot, metric),
        unit: metric.unit(),
    }
}

/// Cards for the current snapshot. Acceleration axes share one card.
pub fn cards(snapshot: &Snapshot) -> Vec<Card> {
    vec![
        Card {
            title: "Temperature",
            readouts: vec![readout(snapshot, Metric::Temp, "Temperature")],
        },
        Card {
            title: "Humidity",
            readouts: vec![readout(snapshot, Metric::Humidity, "Humidity")],
        },
        Card {
            title: "Air Pressure",
            readouts: vec![readout(snapshot, Metric::Pressure, "Air Pressure")],
        },
        Card {
            title: "Acceleration",
            readouts: vec![
                readout(snapshot, Metric::X, "X-axis"),
                readout(snapshot, Metric::Y, "Y-axis"),
                readout(snapshot, Metric::Z, "Z-axis"),
            ],
        },
        Card {
            title: "Altitude",
            readouts: vec![readout(snapshot, Metric::Altitude, "Altitude")],
        },
    ]
}

/// Chart widget configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    pub label: &'static str,
    pub window_size: usize,
    pub tick_decimals: usize,
    pub visible: bool,
}

impl ChartConfig {
    pub fn for_metric(metric: Metric, visible: bool) -> Self {
        Self {
            label: metric.label(),
            window_size: WINDOW_SIZE,
            tick_decimals: TICK_DECIMALS,
            visible,
        }
    }

    pub fn format_tick(&self, value: f64) -> String {
        format_tick(value, self.tick_decimals)
    }
}

pub fn format_tick(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// A named time series: parallel timestamps and values, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    pub label: &'static str,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl SeriesView {
    pub fn from_window(metric: Metric, window: &RollingWindow) -> Self {
        Self {
            label: metric.label(),
            timestamps: window.timestamps(),
            values: window.values(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Timestamps as local wall-clock labels (`HH:MM:SS`).
    pub fn time_labels(&self) -> Vec<String> {
        self.timestamps.iter().map(|t| time_label(*t)).collect()
    }

    /// Y axis bounds fitted to the data; the axis does not start at zero.
    pub fn y_bounds(&self) -> (f64, f64) {
        if self.values.is_empty() {
            return (0.0, 1.0);
        }
        let min = self.values.iter().copied().fold(f64::MAX, f64::min);
        let max = self.values.iter().copied().fold(f64::MIN, f64::max);
        let span = max - min;
        let pad = if span < 1e-9 {
            (max.abs() * 0.05).max(1.0)
        } else {
            span * 0.1
        };
        (min - pad, max + pad)
    }
}

pub fn time_label(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Serialisable dump of the visible window plus current card values.
#[derive(Debug, Clone, Serialize)]
pub struct WindowExport {
    pub metric: Metric,
    pub label: &'static str,
    pub window_size: usize,
    pub exported_at: DateTime<Utc>,
    pub points: Vec<SamplePoint>,
    pub cards: Vec<Card>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_cover_all_seven_metrics_once() {
        let cards = cards(&Snapshot::default());
        let mut metrics: Vec<Metric> = cards
            .iter()
            .flat_map(|c| c.readouts.iter().map(|r| r.metric))
            .collect();
        metrics.sort_by_key(|m| Metric::ALL.iter().position(|x| x == m));
        assert_eq!(metrics, Metric::ALL.to_vec());
        assert_eq!(cards.len(), 5);
    }

    #[test]
    fn altitude_card_is_corrected() {
        let snap = Snapshot {
            altitude: 100.0,
            temp: 20.0,
            ..Default::default()
        };
        let cards = cards(&snap);
        let alt = cards
            .iter()
            .flat_map(|c| c.readouts.iter())
            .find(|r| r.metric == Metric::Altitude)
            .unwrap();
        assert_eq!(alt.value, 2260.0);
        assert_eq!(alt.unit, "m");
        let temp = &cards[0].readouts[0];
        assert_eq!(temp.value, 20.0);
    }

    #[test]
    fn ticks_use_two_decimals() {
        let cfg = ChartConfig::for_metric(Metric::Temp, true);
        assert_eq!(cfg.window_size, 20);
        assert_eq!(cfg.format_tick(21.0), "21.00");
        assert_eq!(cfg.format_tick(-0.456), "-0.46");
        assert_eq!(cfg.label, "Temperature (°C)");
    }

    #[test]
    fn y_bounds_pad_around_data() {
        let series = SeriesView {
            label: "t",
            timestamps: vec![Utc::now(); 3],
            values: vec![10.0, 12.0, 9.0],
        };
        let (lo, hi) = series.y_bounds();
        assert!(lo < 9.0 && lo > 0.0, "axis should not begin at zero: {lo}");
        assert!(hi > 12.0);
    }

    #[test]
    fn y_bounds_flat_series_has_nonzero_span() {
        let series = SeriesView {
            label: "t",
            timestamps: vec![Utc::now(); 2],
            values: vec![2260.0, 2260.0],
        };
        let (lo, hi) = series.y_bounds();
        assert!(hi - lo > 0.0);
        assert!(lo < 2260.0 && hi > 2260.0);
    }

    #[test]
    fn y_bounds_empty_series() {
        let series = SeriesView::from_window(Metric::Temp, &RollingWindow::new());
        assert!(series.is_empty());
        assert_eq!(series.y_bounds(), (0.0, 1.0));
    }

    #[test]
    fn time_labels_are_clock_formatted() {
        let series = SeriesView {
            label: "t",
            timestamps: vec![Utc::now()],
            values: vec![1.0],
        };
        let labels = series.time_labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].len(), 8);
        assert_eq!(labels[0].matches(':').count(), 2);
    }
}
