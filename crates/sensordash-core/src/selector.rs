//! Which metric is being charted.

use crate::metric::Metric;
use crate::window::RollingWindow;

/// Holds the single active metric.
///
/// Selecting resets the window the selector guards, so the window never mixes
/// points from two selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricSelector {
    active: Metric,
}

impl MetricSelector {
    pub fn new(initial: Metric) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> Metric {
        self.active
    }

    /// Switch the active metric and clear `window`, even when `metric` is
    /// already active.
    pub fn select(&mut self, metric: Metric, window: &mut RollingWindow) {
        log::debug!(
            "metric {} -> {} (dropping {} points)",
            self.active,
            metric,
            window.len()
        );
        self.active = metric;
        window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn switching_clears_window() {
        let mut sel = MetricSelector::default();
        let mut w = RollingWindow::new();
        w.append(Utc::now(), 1.0);
        w.append(Utc::now(), 2.0);
        sel.select(Metric::Humidity, &mut w);
        assert_eq!(sel.active(), Metric::Humidity);
        assert!(w.is_empty());
    }

    #[test]
    fn reselecting_same_metric_still_clears() {
        let mut sel = MetricSelector::new(Metric::Pressure);
        let mut w = RollingWindow::new();
        w.append(Utc::now(), 101_000.0);
        sel.select(Metric::Pressure, &mut w);
        assert_eq!(sel.active(), Metric::Pressure);
        assert!(w.is_empty());
    }
}
