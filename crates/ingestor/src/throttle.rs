//! Politeness limiter shared by every worker that talks to the archive API.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Serializes upstream requests and keeps at least `pause` between the end of
/// one request and the start of the next. Clones share the same limiter.
#[derive(Clone, Debug)]
pub struct Throttle {
    pause: Duration,
    last_finished: Arc<Mutex<Option<Instant>>>,
}

/// Held for the duration of one upstream request.
pub struct ThrottlePermit<'a> {
    last_finished: MutexGuard<'a, Option<Instant>>,
}

impl Throttle {
    pub fn new(pause: Duration) -> Self {
        Self {
            pause,
            last_finished: Arc::new(Mutex::new(None)),
        }
    }

    /// No pause between requests; requests are still serialized.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Wait for our turn. The next caller is released `pause` after this
    /// permit is dropped.
    pub async fn acquire(&self) -> ThrottlePermit<'_> {
        let last_finished = self.last_finished.lock().await;
        if let Some(finished) = *last_finished {
            tokio::time::sleep_until(finished + self.pause).await;
        }
        ThrottlePermit { last_finished }
    }
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        *self.last_finished = Some(Instant::now());
    }
}
