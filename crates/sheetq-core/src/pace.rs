//! Debounce and throttle helpers for bursty UI-driven calls (search input,
//! quantity steppers) before they reach the request queue.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Runs only the last of a burst of calls, `wait` after the burst ends.
#[derive(Debug)]
pub struct Debouncer {
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `f` after the debounce window, cancelling any call still pending.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let wait = self.wait;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            f();
        });
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }
}

/// Lets at most one call through per `limit` window; calls inside the window are dropped.
#[derive(Debug)]
pub struct Throttle {
    limit: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last: Mutex::new(None),
        }
    }

    /// Run `f` unless a call ran less than `limit` ago. Returns whether `f` ran.
    pub fn try_call<F>(&self, f: F) -> bool
    where
        F: FnOnce(),
    {
        let now = Instant::now();
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(*last, Some(at) if now.duration_since(at) < self.limit) {
                return false;
            }
            *last = Some(now);
        }
        f();
        true
    }
}
