//! Caller-side handle for a submitted request.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

use super::request::RequestId;

/// Failure delivered to the caller of [`RequestQueue::submit`](super::RequestQueue::submit).
#[derive(Debug, Error)]
pub enum RequestError<E> {
    /// The call failed terminally or exhausted its retries. Carries the call's
    /// own error unchanged.
    #[error("{0}")]
    Failed(E),
    /// The queue was cleared while the request was still waiting.
    #[error("request queue cleared")]
    Cleared,
    /// The request was dropped without settling (the call panicked or the
    /// runtime shut down).
    #[error("request abandoned before settlement")]
    Abandoned,
}

impl<E> RequestError<E> {
    /// The call's error, if the request failed remotely.
    pub fn failure(&self) -> Option<&E> {
        match self {
            RequestError::Failed(e) => Some(e),
            RequestError::Cleared | RequestError::Abandoned => None,
        }
    }

    pub fn into_failure(self) -> Option<E> {
        match self {
            RequestError::Failed(e) => Some(e),
            RequestError::Cleared | RequestError::Abandoned => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, RequestError::Cleared)
    }
}

/// Future resolving to the settlement of one submitted request.
///
/// Dropping the ticket does not cancel the request; it still runs when admitted.
#[derive(Debug)]
pub struct Ticket<T, E> {
    id: RequestId,
    rx: oneshot::Receiver<Result<T, RequestError<E>>>,
}

impl<T, E> Ticket<T, E> {
    pub(crate) fn new(id: RequestId, rx: oneshot::Receiver<Result<T, RequestError<E>>>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl<T, E> Future for Ticket<T, E> {
    type Output = Result<T, RequestError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(RequestError::Abandoned)))
    }
}
