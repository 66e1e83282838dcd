//! # sensordash-core
//!
//! Live telemetry model for a single environmental sensor board: temperature,
//! humidity, pressure, three acceleration axes and altitude.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use sensordash_core::{Dashboard, Metric, SimulatedSource, SubscriptionDriver};
//!
//! let mut dash = Dashboard::new(Metric::Temp, true);
//! let mut driver = SubscriptionDriver::new(Box::new(SimulatedSource::new(
//!     Duration::from_millis(200),
//!     Some(1),
//! )));
//! driver.start().unwrap();
//! driver.pump_timeout(&mut dash, Duration::from_secs(1), |_, d| {
//!     println!("{} = {:.2}", d.metric, d.value);
//! });
//! driver.stop();
//! ```
//!
//! ## Architecture
//!
//! Source → Driver (channel) → Store → Derive → Window → View
//!
//! Every source implements the [`PushSource`] trait and pushes owned
//! snapshots from its own worker. The [`SubscriptionDriver`] applies them on
//! the thread that owns the [`Dashboard`], one at a time, in arrival order.
//! Altitude is shown with a fixed [`ALTITUDE_OFFSET`] added; every other
//! field passes through unchanged.

pub mod dashboard;
pub mod derive;
pub mod driver;
pub mod error;
pub mod metric;
pub mod selector;
pub mod snapshot;
pub mod source;
pub mod sources;
pub mod view;
pub mod window;

pub use dashboard::Dashboard;
pub use derive::{ALTITUDE_OFFSET, Derived, corrected_value};
pub use driver::{DriverState, SubscriptionDriver};
pub use error::{DashError, Result};
pub use metric::Metric;
pub use selector::MetricSelector;
pub use snapshot::{Snapshot, SnapshotStore};
pub use source::{
    CancelToken, DEFAULT_PATH, PushSource, SnapshotSink, SourceInfo, SourceKind, Subscription,
    spawn_worker,
};
pub use sources::{FirebaseSource, ReplaySource, SimulatedSource, sleep_cancellable};
pub use view::{Card, ChartConfig, Readout, SeriesView, TICK_DECIMALS, WindowExport, format_tick};
pub use window::{RollingWindow, SamplePoint, WINDOW_SIZE};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
