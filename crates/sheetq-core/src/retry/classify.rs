//! Classify remote failures into retryable vs. terminal.

use super::error::{FailureKind, RemoteError};

/// Outcome of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Transient; worth another attempt after backoff.
    Retryable,
    /// Must not be retried; settle the request with this failure.
    Terminal,
}

/// Implemented by error types that can be handed to the retry executor.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for RemoteError {
    fn failure_kind(&self) -> FailureKind {
        self.kind()
    }
}

impl Classify for FailureKind {
    fn failure_kind(&self) -> FailureKind {
        *self
    }
}

/// Classify a failure kind for retry decisions.
///
/// 403 is checked before the 4xx bucket, and 408/429 are carved out of it.
/// Unknown failures are retried.
pub fn classify(kind: FailureKind) -> Classification {
    match kind {
        FailureKind::Unauthorized | FailureKind::HttpStatus(403) => Classification::Terminal,
        FailureKind::HttpStatus(429) | FailureKind::HttpStatus(408) => Classification::Retryable,
        FailureKind::HttpStatus(500..=599) => Classification::Retryable,
        FailureKind::HttpStatus(400..=499) => Classification::Terminal,
        FailureKind::HttpStatus(_)
        | FailureKind::Timeout
        | FailureKind::Network
        | FailureKind::ResourceExhausted
        | FailureKind::Unknown => Classification::Retryable,
    }
}

const RESOURCE_SIGNATURES: &[&str] = &["ERR_INSUFFICIENT_RESOURCES"];
const NETWORK_SIGNATURES: &[&str] = &["Failed to fetch", "NetworkError"];

/// Infer a failure kind from a loose status/message pair.
///
/// Checks run in the same order as [`classify`] evaluates them, so a 404 that
/// reports "Failed to fetch" is still treated as a network failure while a 403
/// is always an authorization failure.
pub fn infer_kind(status: Option<u16>, message: &str) -> FailureKind {
    if status == Some(403) {
        return FailureKind::HttpStatus(403);
    }
    if RESOURCE_SIGNATURES.iter().any(|s| message.contains(s)) {
        return FailureKind::ResourceExhausted;
    }
    if NETWORK_SIGNATURES.iter().any(|s| message.contains(s)) {
        return FailureKind::Network;
    }
    match status {
        Some(code @ (429 | 500..=599 | 408)) => FailureKind::HttpStatus(code),
        _ if message.contains("timeout") => FailureKind::Timeout,
        Some(code) => FailureKind::HttpStatus(code),
        None => FailureKind::Unknown,
    }
}

impl RemoteError {
    /// Build an error from a loose status/message pair, inferring its kind.
    pub fn infer(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        RemoteError::new(infer_kind(status, &message), message)
    }
}
