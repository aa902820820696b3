//! Bearer credential injection for queued spreadsheet calls.
//!
//! Each attempt reads the current token from a [`CredentialSource`] right
//! before the call runs, so a token refreshed during backoff is picked up by
//! the next retry. A terminal authorization failure invalidates the source so
//! the UI layer can prompt for sign-in again.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::queue::{RequestQueue, SubmitOptions, Ticket};
use crate::retry::RemoteError;

/// Supplies the bearer token attached to outgoing calls.
pub trait CredentialSource: Send + Sync {
    /// Current bearer token, or `None` if the user is signed out.
    fn bearer(&self) -> Option<String>;

    /// Drop the current token after the remote rejected it.
    fn invalidate(&self);
}

/// In-memory token slot shared between the sign-in flow and the queue.
#[derive(Debug, Default)]
pub struct SharedToken {
    token: RwLock<Option<String>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl CredentialSource for SharedToken {
    fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn invalidate(&self) {
        tracing::warn!("bearer token rejected; clearing stored credential");
        self.clear();
    }
}

/// Submit `call` with the current bearer token injected before every attempt.
///
/// A missing token fails the attempt with [`FailureKind::Unauthorized`](crate::retry::FailureKind::Unauthorized),
/// which is terminal.
pub fn submit_authorized<T, F, Fut>(
    queue: &RequestQueue,
    source: Arc<dyn CredentialSource>,
    options: SubmitOptions,
    mut call: F,
) -> Ticket<T, RemoteError>
where
    T: Send + 'static,
    F: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
{
    queue.submit(
        move || {
            let source = Arc::clone(&source);
            let attempt = source.bearer().map(&mut call);
            async move {
                let Some(fut) = attempt else {
                    return Err(RemoteError::unauthorized("no bearer credential available"));
                };
                let result = fut.await;
                if matches!(&result, Err(e) if e.is_authorization()) {
                    source.invalidate();
                }
                result
            }
        },
        options,
    )
}
