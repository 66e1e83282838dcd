//! Push source trait and the plumbing sources use to deliver snapshots.
//!
//! A source runs its own worker (thread, runtime, network stream) and pushes
//! owned [`Snapshot`] values into a [`SnapshotSink`]. It never touches
//! dashboard state; the [`SubscriptionDriver`](crate::SubscriptionDriver)
//! drains the sink on the thread that owns the dashboard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::snapshot::Snapshot;

/// Upstream path subscribed to when none is configured.
pub const DEFAULT_PATH: &str = "sensor";

/// Kind of upstream a source talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Firebase Realtime Database streaming REST endpoint.
    Firebase,
    /// Local HTTP endpoint that devices push to.
    HttpIngest,
    /// Recorded JSON lines played back at a fixed rate.
    Replay,
    /// Synthetic random-walk readings.
    Simulated,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Firebase => write!(f, "firebase"),
            Self::HttpIngest => write!(f, "http"),
            Self::Replay => write!(f, "replay"),
            Self::Simulated => write!(f, "simulate"),
        }
    }
}

/// Metadata about a push source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Short identifier shown in the title bar.
    pub name: String,
    pub kind: SourceKind,
    /// Fixed upstream path the subscription is bound to.
    pub path: String,
    /// Where the data comes from (URL, address, file).
    pub origin: String,
}

/// Trait every push source implements.
pub trait PushSource: Send {
    fn info(&self) -> &SourceInfo;

    /// Open one subscription. Every snapshot must go through `sink`, and the
    /// worker must stop delivering once the sink reports it is cancelled.
    fn subscribe(&mut self, sink: SnapshotSink) -> Result<Subscription>;

    /// Convenience: name from info.
    fn name(&self) -> &str {
        &self.info().name
    }
}

/// Shared cancellation flag between a subscription and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Delivery handle given to a source for one subscription.
#[derive(Debug, Clone)]
pub struct SnapshotSink {
    tx: Sender<Snapshot>,
    token: CancelToken,
}

impl SnapshotSink {
    pub fn new(tx: Sender<Snapshot>, token: CancelToken) -> Self {
        Self { tx, token }
    }

    /// Deliver one snapshot. Returns `false` once the subscription has been
    /// cancelled or its driver is gone; the worker should then exit.
    pub fn deliver(&self, snapshot: Snapshot) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.tx.send(snapshot).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }
}

/// A live subscription. Cancelling (or dropping) it stops delivery.
pub struct Subscription {
    token: CancelToken,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            on_cancel: None,
            worker: None,
        }
    }

    /// Attach the worker thread driving this subscription.
    pub fn with_worker(mut self, worker: JoinHandle<()>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Run `hook` once when the subscription is cancelled (e.g. to signal a
    /// server shutdown).
    pub fn on_cancel(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// Idempotent.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the worker thread has exited (always true without a worker).
    pub fn worker_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(|w| w.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a named worker thread for a source.
pub fn spawn_worker<F>(name: &str, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(format!("sensordash-{name}"))
        .spawn(f)?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn sink_delivers_until_cancelled() {
        let (tx, rx) = mpsc::channel();
        let token = CancelToken::new();
        let sink = SnapshotSink::new(tx, token.clone());
        assert!(sink.deliver(Snapshot::default()));
        token.cancel();
        assert!(!sink.deliver(Snapshot::default()));
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn sink_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        let sink = SnapshotSink::new(tx, CancelToken::new());
        drop(rx);
        assert!(!sink.deliver(Snapshot::default()));
    }

    #[test]
    fn cancel_runs_hook_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut sub = Subscription::new(CancelToken::new()).on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.cancel();
        sub.cancel();
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_cancels_token() {
        let token = CancelToken::new();
        let sub = Subscription::new(token.clone());
        assert!(!sub.is_cancelled());
        drop(sub);
        assert!(token.is_cancelled());
    }

    #[test]
    fn source_kind_display() {
        assert_eq!(SourceKind::Firebase.to_string(), "firebase");
        assert_eq!(SourceKind::HttpIngest.to_string(), "http");
        assert_eq!(SourceKind::Replay.to_string(), "replay");
        assert_eq!(SourceKind::Simulated.to_string(), "simulate");
    }
}
