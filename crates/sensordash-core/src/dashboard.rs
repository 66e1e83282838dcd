//! Dashboard state: the snapshot store, metric selector and chart window
//! composed behind one owner.
//!
//! All mutation goes through `&mut Dashboard`, so a single thread applies
//! snapshots one at a time and no locking is needed.

use chrono::{DateTime, Utc};

use crate::derive::{self, Derived};
use crate::metric::Metric;
use crate::selector::MetricSelector;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::view::{self, Card, ChartConfig, SeriesView, WindowExport};
use crate::window::RollingWindow;

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    store: SnapshotStore,
    selector: MetricSelector,
    window: RollingWindow,
    chart_visible: bool,
}

impl Dashboard {
    pub fn new(initial: Metric, chart_visible: bool) -> Self {
        Self {
            store: SnapshotStore::new(),
            selector: MetricSelector::new(initial),
            window: RollingWindow::new(),
            chart_visible,
        }
    }

    /// Apply one snapshot arriving now.
    pub fn ingest(&mut self, snapshot: Snapshot) -> Derived {
        self.ingest_at(snapshot, Utc::now())
    }

    /// Apply one snapshot: store it, then derive and append the value for the
    /// metric active at this moment.
    pub fn ingest_at(&mut self, snapshot: Snapshot, at: DateTime<Utc>) -> Derived {
        self.store.set(snapshot);
        derive::on_snapshot(self.store.get(), self.selector.active(), at, &mut self.window)
    }

    /// Change the charted metric. The window always starts over.
    pub fn select(&mut self, metric: Metric) {
        self.selector.select(metric, &mut self.window);
    }

    pub fn select_next(&mut self) {
        self.select(self.active().next());
    }

    pub fn select_prev(&mut self) {
        self.select(self.active().prev());
    }

    pub fn toggle_chart(&mut self) {
        self.chart_visible = !self.chart_visible;
    }

    pub fn set_chart_visible(&mut self, visible: bool) {
        self.chart_visible = visible;
    }

    pub fn active(&self) -> Metric {
        self.selector.active()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.store.get()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn chart_visible(&self) -> bool {
        self.chart_visible
    }

    pub fn cards(&self) -> Vec<Card> {
        view::cards(self.store.get())
    }

    pub fn series(&self) -> SeriesView {
        SeriesView::from_window(self.active(), &self.window)
    }

    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig::for_metric(self.active(), self.chart_visible)
    }

    pub fn export(&self) -> WindowExport {
        WindowExport {
            metric: self.active(),
            label: self.active().label(),
            window_size: self.window.capacity(),
            exported_at: Utc::now(),
            points: self.window.points().copied().collect(),
            cards: self.cards(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(v: f64) -> Snapshot {
        Snapshot {
            temp: v,
            ..Default::default()
        }
    }

    #[test]
    fn starts_hidden_on_temp_with_zero_values() {
        let dash = Dashboard::default();
        assert_eq!(dash.active(), Metric::Temp);
        assert!(!dash.chart_visible());
        assert!(dash.window().is_empty());
        for r in dash.cards().iter().flat_map(|c| c.readouts.iter()) {
            let expected = if r.metric == Metric::Altitude { 2160.0 } else { 0.0 };
            assert_eq!(r.value, expected, "{:?}", r.metric);
        }
    }

    #[test]
    fn temp_sequence_lands_in_arrival_order() {
        let mut dash = Dashboard::new(Metric::Temp, true);
        for v in [10.0, 12.0, 9.0] {
            dash.ingest(temp(v));
        }
        assert_eq!(dash.window().values(), vec![10.0, 12.0, 9.0]);
        assert_eq!(*dash.snapshot(), temp(9.0));
    }

    #[test]
    fn selection_change_empties_window_and_retargets() {
        let mut dash = Dashboard::new(Metric::Temp, true);
        dash.ingest(Snapshot {
            temp: 10.0,
            humidity: 40.0,
            ..Default::default()
        });
        dash.select(Metric::Humidity);
        assert!(dash.window().is_empty());

        dash.ingest(Snapshot {
            temp: 11.0,
            humidity: 41.0,
            ..Default::default()
        });
        assert_eq!(dash.window().values(), vec![41.0]);
        assert_eq!(dash.series().label, "Humidity (%)");
    }

    #[test]
    fn selection_keeps_the_snapshot() {
        let mut dash = Dashboard::default();
        dash.ingest(temp(30.0));
        dash.select_next();
        assert_eq!(dash.snapshot().temp, 30.0);
        assert_eq!(dash.active(), Metric::Humidity);
        dash.select_prev();
        assert_eq!(dash.active(), Metric::Temp);
    }

    #[test]
    fn altitude_derivation_matches_card() {
        let mut dash = Dashboard::new(Metric::Altitude, false);
        let d = dash.ingest(Snapshot {
            altitude: 100.0,
            ..Default::default()
        });
        assert_eq!(d.value, 2260.0);
        assert_eq!(dash.window().values(), vec![2260.0]);
        let card = dash.cards().into_iter().find(|c| c.title == "Altitude").unwrap();
        assert_eq!(card.readouts[0].value, 2260.0);
    }

    #[test]
    fn toggle_chart_flips_visibility() {
        let mut dash = Dashboard::default();
        dash.toggle_chart();
        assert!(dash.chart_config().visible);
        dash.toggle_chart();
        assert!(!dash.chart_config().visible);
    }

    #[test]
    fn export_serialises_window_points() {
        let mut dash = Dashboard::default();
        dash.ingest(temp(1.25));
        dash.ingest(temp(2.5));
        let doc = serde_json::to_value(dash.export()).unwrap();
        assert_eq!(doc["metric"], "temp");
        assert_eq!(doc["window_size"], 20);
        let points = doc["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1]["value"], 2.5);
        assert!(points[0]["timestamp"].is_string());
        assert_eq!(doc["cards"].as_array().unwrap().len(), 5);
    }
}
