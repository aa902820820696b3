//! Throttled, prioritized request queue.
//!
//! Submitted calls wait in priority order until one of `concurrency_limit`
//! slots frees up, then run through the retry executor on their own task.
//! Every submission settles its [`Ticket`] exactly once: with the call's
//! value, its final error, [`RequestError::Cleared`] if the queue was cleared
//! while it waited, or [`RequestError::Abandoned`] if it was dropped unsettled.

mod request;
mod slot;
mod status;
mod ticket;
mod waiting;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::retry::{Classify, RetryPolicy};

use request::Request;
use slot::ActiveSlot;
use waiting::WaitingList;

pub use request::{RequestId, SubmitOptions};
pub use status::QueueStatus;
pub use ticket::{RequestError, Ticket};

/// Queue parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueConfig {
    /// Maximum number of simultaneously active requests (clamped to at least 1).
    pub concurrency_limit: usize,
    /// Default retry budget for submissions that do not specify one.
    pub retry_attempts: u32,
    /// Backoff policy shared by every request.
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 3,
            retry_attempts: 3,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Default)]
struct QueueState {
    waiting: WaitingList,
    active: usize,
}

pub(crate) struct Shared {
    config: QueueConfig,
    next_id: AtomicU64,
    state: Mutex<QueueState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release_slot(&self) {
        let mut state = self.state();
        state.active = state.active.saturating_sub(1);
    }
}

/// Admit waiting requests while slots are free. The lock is never held across
/// a suspension point; admitted jobs are spawned after it is released.
fn admit(shared: &Arc<Shared>, handle: &Handle) {
    let admitted = {
        let mut state = shared.state();
        let mut admitted = Vec::new();
        while state.active < shared.config.concurrency_limit {
            let Some(job) = state.waiting.pop_front() else {
                break;
            };
            state.active += 1;
            admitted.push(job);
        }
        admitted
    };

    for job in admitted {
        tracing::debug!(request = %job.id(), priority = job.priority(), "request admitted");
        let slot = ActiveSlot::new(Arc::clone(shared));
        handle.spawn(job.run(shared.config.retry, slot));
    }
}

/// Handle to a request queue. Clones share the same waiting list and slots.
#[derive(Clone)]
pub struct RequestQueue {
    shared: Arc<Shared>,
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestQueue")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .finish()
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl RequestQueue {
    pub fn new(mut config: QueueConfig) -> Self {
        config.concurrency_limit = config.concurrency_limit.max(1);
        Self {
            shared: Arc::new(Shared {
                config,
                next_id: AtomicU64::new(1),
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Enqueue `call` and start it as soon as a slot is free.
    ///
    /// The request is inserted synchronously; the returned [`Ticket`] only
    /// observes the settlement. Retries use `options.retries` or the queue's
    /// default budget.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit<T, E, F, Fut>(&self, call: F, options: SubmitOptions) -> Ticket<T, E>
    where
        T: Send + 'static,
        E: Classify + fmt::Display + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let handle = Handle::current();
        let id = RequestId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        let request = Request {
            id,
            priority: options.priority,
            retries: options
                .retries
                .unwrap_or(self.shared.config.retry_attempts),
            call,
            tx,
        };
        tracing::debug!(request = %id, priority = options.priority, "request queued");
        self.shared.state().waiting.insert(Box::new(request));
        admit(&self.shared, &handle);
        Ticket::new(id, rx)
    }

    /// Settle every waiting request with [`RequestError::Cleared`].
    ///
    /// Active requests are unaffected and run to completion. Returns the
    /// number of cancelled requests.
    pub fn clear(&self) -> usize {
        let cancelled = self.shared.state().waiting.drain();
        let count = cancelled.len();
        for job in cancelled {
            tracing::debug!(request = %job.id(), "request cancelled");
            job.cancel();
        }
        if count > 0 {
            tracing::info!("request queue cleared, {} waiting request(s) cancelled", count);
        }
        count
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.shared.state();
        QueueStatus {
            waiting_count: state.waiting.len(),
            active_count: state.active,
            concurrency_limit: self.shared.config.concurrency_limit,
        }
    }
}

#[cfg(test)]
mod tests;
