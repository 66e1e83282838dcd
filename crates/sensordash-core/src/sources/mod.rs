//! Push source implementations.
//!
//! - [`FirebaseSource`]: Firebase Realtime Database streaming REST API.
//! - [`ReplaySource`]: JSON-lines recordings played back at a fixed rate.
//! - [`SimulatedSource`]: seeded random-walk readings for demos and tests.
//!
//! The HTTP ingest source lives in `sensordash-server`.

mod firebase;
mod replay;
mod simulated;

pub use firebase::{FirebaseSource, FirebaseStream, SseEvent, SseParser, StreamAction};
pub use replay::{ReplaySource, parse_lines};
pub use simulated::{SimulatedSource, Walker};

use std::time::{Duration, Instant};

use crate::source::CancelToken;

/// Sleep for `dur`, waking early if `token` is cancelled. Returns `false` if
/// cancelled.
pub fn sleep_cancellable(token: &CancelToken, dur: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(25);
    let deadline = Instant::now() + dur;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_returns_true_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(sleep_cancellable(&token, Duration::from_millis(5)));
    }

    #[test]
    fn sleep_wakes_early_on_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(!sleep_cancellable(&token, Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
