//! Subscription driver: owns the push source and applies its snapshots.
//!
//! States are `Idle` and `Subscribed`. Each `start` opens a fresh channel, so
//! once `stop` drops the receiver nothing from the old subscription can reach
//! the dashboard. The active metric is read from the [`Dashboard`] each time a
//! snapshot is applied, never captured when the subscription opens.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::dashboard::Dashboard;
use crate::derive::Derived;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::source::{CancelToken, PushSource, SnapshotSink, SourceInfo, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Subscribed,
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Subscribed => write!(f, "subscribed"),
        }
    }
}

struct ActiveSubscription {
    subscription: Subscription,
    rx: Receiver<Snapshot>,
    closed: bool,
}

pub struct SubscriptionDriver {
    source: Box<dyn PushSource>,
    active: Option<ActiveSubscription>,
    applied: u64,
}

impl SubscriptionDriver {
    pub fn new(source: Box<dyn PushSource>) -> Self {
        Self {
            source,
            active: None,
            applied: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        if self.active.is_some() {
            DriverState::Subscribed
        } else {
            DriverState::Idle
        }
    }

    pub fn source_info(&self) -> &SourceInfo {
        self.source.info()
    }

    /// Open a subscription. Any existing one is stopped first.
    pub fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            self.stop();
        }

        let (tx, rx) = mpsc::channel();
        let token = CancelToken::new();
        let sink = SnapshotSink::new(tx, token);
        let subscription = self.source.subscribe(sink)?;
        log::info!(
            "subscribed to {} ({}, path '{}')",
            self.source.name(),
            self.source.info().kind,
            self.source.info().path
        );
        self.active = Some(ActiveSubscription {
            subscription,
            rx,
            closed: false,
        });
        Ok(())
    }

    /// Tear the subscription down. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.subscription.cancel();
            log::info!("unsubscribed from {}", self.source.name());
        }
    }

    /// Apply every snapshot waiting in the channel without blocking.
    pub fn pump(&mut self, dashboard: &mut Dashboard) -> usize {
        self.pump_with(dashboard, |_, _| {})
    }

    /// Like [`pump`](Self::pump), calling `on_applied` after each snapshot.
    pub fn pump_with<F>(&mut self, dashboard: &mut Dashboard, mut on_applied: F) -> usize
    where
        F: FnMut(&Snapshot, &Derived),
    {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };

        let mut n = 0;
        loop {
            match active.rx.try_recv() {
                Ok(snapshot) => {
                    let derived = dashboard.ingest(snapshot);
                    on_applied(&snapshot, &derived);
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    mark_closed(active, self.source.name());
                    break;
                }
            }
        }
        self.applied += n as u64;
        n
    }

    /// Wait up to `timeout` for the next snapshot, then drain the rest.
    pub fn pump_timeout<F>(
        &mut self,
        dashboard: &mut Dashboard,
        timeout: Duration,
        mut on_applied: F,
    ) -> usize
    where
        F: FnMut(&Snapshot, &Derived),
    {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };
        if active.closed {
            return 0;
        }

        match active.rx.recv_timeout(timeout) {
            Ok(snapshot) => {
                let derived = dashboard.ingest(snapshot);
                on_applied(&snapshot, &derived);
                self.applied += 1;
                1 + self.pump_with(dashboard, on_applied)
            }
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                mark_closed(active, self.source.name());
                0
            }
        }
    }

    /// True once the current subscription's source has stopped sending.
    pub fn source_closed(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.closed)
    }

    /// Snapshots applied over the driver's lifetime.
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

fn mark_closed(active: &mut ActiveSubscription, name: &str) {
    if !active.closed {
        active.closed = true;
        log::info!("{name} stopped sending");
    }
}

impl Drop for SubscriptionDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use crate::source::SourceKind;
    use std::sync::{Arc, Mutex};

    /// Source that hands its sinks to the test so deliveries are explicit.
    struct ManualSource {
        info: SourceInfo,
        sinks: Arc<Mutex<Vec<SnapshotSink>>>,
        fail: bool,
    }

    impl ManualSource {
        fn new() -> (Self, Arc<Mutex<Vec<SnapshotSink>>>) {
            let sinks = Arc::new(Mutex::new(Vec::new()));
            let source = Self {
                info: SourceInfo {
                    name: "manual".into(),
                    kind: SourceKind::Simulated,
                    path: "sensor".into(),
                    origin: "test".into(),
                },
                sinks: Arc::clone(&sinks),
                fail: false,
            };
            (source, sinks)
        }
    }

    impl PushSource for ManualSource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }

        fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription> {
            if self.fail {
                return Err(crate::DashError::subscribe("manual", "refused"));
            }
            let token = sink.token();
            self.sinks.lock().unwrap().push(sink);
            Ok(Subscription::new(token))
        }
    }

    fn temp(v: f64) -> Snapshot {
        Snapshot {
            temp: v,
            ..Default::default()
        }
    }

    fn last_sink(sinks: &Arc<Mutex<Vec<SnapshotSink>>>) -> SnapshotSink {
        sinks.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn idle_until_started() {
        let (source, _) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.pump(&mut dash), 0);
        driver.start().unwrap();
        assert_eq!(driver.state(), DriverState::Subscribed);
    }

    #[test]
    fn applies_in_arrival_order() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::new(Metric::Temp, true);
        driver.start().unwrap();

        let sink = last_sink(&sinks);
        for v in [10.0, 12.0, 9.0] {
            assert!(sink.deliver(temp(v)));
        }
        assert_eq!(driver.pump(&mut dash), 3);
        assert_eq!(dash.window().values(), vec![10.0, 12.0, 9.0]);
        assert_eq!(*dash.snapshot(), temp(9.0));
        assert_eq!(driver.applied(), 3);
    }

    #[test]
    fn metric_is_read_at_apply_time() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::new(Metric::Temp, true);
        driver.start().unwrap();
        let sink = last_sink(&sinks);

        sink.deliver(Snapshot {
            temp: 1.0,
            altitude: 5.0,
            ..Default::default()
        });
        dash.select(Metric::Altitude);
        driver.pump(&mut dash);

        assert_eq!(dash.window().values(), vec![2165.0]);
        assert_eq!(sinks.lock().unwrap().len(), 1, "no resubscription on metric change");
    }

    #[test]
    fn stop_twice_is_harmless_and_blocks_delivery() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        driver.start().unwrap();
        let sink = last_sink(&sinks);

        sink.deliver(temp(1.0));
        driver.stop();
        driver.stop();
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(sink.is_cancelled());
        assert!(!sink.deliver(temp(2.0)));
        assert_eq!(driver.pump(&mut dash), 0);
        assert!(dash.window().is_empty());
    }

    #[test]
    fn restart_replaces_the_previous_subscription() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        driver.start().unwrap();
        let first = last_sink(&sinks);
        driver.start().unwrap();
        let second = last_sink(&sinks);

        assert!(first.is_cancelled());
        assert!(!first.deliver(temp(1.0)));
        assert!(second.deliver(temp(2.0)));
        assert_eq!(driver.pump(&mut dash), 1);
        assert_eq!(dash.window().values(), vec![2.0]);
    }

    #[test]
    fn failed_subscribe_stays_idle() {
        let (mut source, _) = ManualSource::new();
        source.fail = true;
        let mut driver = SubscriptionDriver::new(Box::new(source));
        assert!(driver.start().is_err());
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn closed_source_is_reported() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        driver.start().unwrap();
        let sink = last_sink(&sinks);
        sink.deliver(temp(4.0));
        sinks.lock().unwrap().clear();
        drop(sink);

        assert_eq!(driver.pump(&mut dash), 1);
        assert!(driver.source_closed());
        assert_eq!(driver.state(), DriverState::Subscribed);
    }

    #[test]
    fn pump_timeout_waits_for_a_delivery() {
        let (source, sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        driver.start().unwrap();
        let sink = last_sink(&sinks);

        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            sink.deliver(temp(7.0));
        });
        let mut seen = Vec::new();
        let n = driver.pump_timeout(&mut dash, Duration::from_secs(5), |_, d| seen.push(d.value));
        worker.join().unwrap();
        assert_eq!(n, 1);
        assert_eq!(seen, vec![7.0]);
    }

    #[test]
    fn pump_timeout_returns_zero_when_quiet() {
        let (source, _sinks) = ManualSource::new();
        let mut driver = SubscriptionDriver::new(Box::new(source));
        let mut dash = Dashboard::default();
        driver.start().unwrap();
        let n = driver.pump_timeout(&mut dash, Duration::from_millis(10), |_, _| {});
        assert_eq!(n, 0);
    }
}
