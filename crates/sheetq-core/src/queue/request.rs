//! A single queued remote call and its type-erased handle.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::retry::{run_with_retry, Classify, RetryPolicy};

use super::slot::ActiveSlot;
use super::ticket::RequestError;

pub(crate) type JobFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Identity of a submitted request. Used for ordering diagnostics only;
/// identical calls are never deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-request submission options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Higher is serviced sooner. Any value is accepted.
    pub priority: i32,
    /// Retries allowed beyond the first attempt; `None` uses the queue default.
    pub retries: Option<u32>,
}

impl SubmitOptions {
    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            retries: None,
        }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Type-erased queued request as seen by the waiting list and admission logic.
pub(crate) trait Job: Send {
    fn id(&self) -> RequestId;

    fn priority(&self) -> i32;

    /// Drive the call through the retry executor. `slot` is released before the
    /// outcome is delivered to the caller.
    fn run(self: Box<Self>, policy: RetryPolicy, slot: ActiveSlot) -> JobFuture;

    /// Settle a still-waiting request with [`RequestError::Cleared`].
    fn cancel(self: Box<Self>);
}

pub(crate) struct Request<T, E, F> {
    pub(crate) id: RequestId,
    pub(crate) priority: i32,
    pub(crate) retries: u32,
    pub(crate) call: F,
    pub(crate) tx: oneshot::Sender<Result<T, RequestError<E>>>,
}

impl<T, E, F, Fut> Job for Request<T, E, F>
where
    T: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn id(&self) -> RequestId {
        self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn run(self: Box<Self>, policy: RetryPolicy, slot: ActiveSlot) -> JobFuture {
        let Request {
            id,
            retries,
            call,
            tx,
            ..
        } = *self;
        Box::pin(async move {
            let result = run_with_retry(&policy, retries, call)
                .await
                .map_err(RequestError::Failed);
            tracing::debug!(request = %id, ok = result.is_ok(), "request settled");
            slot.release();
            if tx.send(result).is_err() {
                tracing::debug!(request = %id, "ticket dropped before settlement");
            }
        })
    }

    fn cancel(self: Box<Self>) {
        let _ = self.tx.send(Err(RequestError::Cleared));
    }
}
