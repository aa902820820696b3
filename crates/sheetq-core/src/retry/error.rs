//! Remote call failure type for retry classification.

use std::fmt;

use thiserror::Error;

/// Tagged failure kind reported by a remote call.
///
/// Call sites that know why a request failed (transport error, HTTP status,
/// client-side timeout) should construct the matching kind directly instead of
/// relying on message inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transport-level failure (connection refused, DNS, "Failed to fetch").
    Network,
    /// The client ran out of local resources (sockets, request slots).
    ResourceExhausted,
    /// Request timed out before a response arrived.
    Timeout,
    /// The remote answered with a non-success HTTP status.
    HttpStatus(u16),
    /// No usable bearer credential was available for the call.
    Unauthorized,
    /// Nothing recognizable about the failure.
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::ResourceExhausted => write!(f, "resource exhausted"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::Unknown => write!(f, "unknown error"),
        }
    }
}

/// Error returned by a single remote call (spreadsheet read/write, metadata probe).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    kind: FailureKind,
    message: String,
}

impl RemoteError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ResourceExhausted, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::HttpStatus(status), message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthorized, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }

    /// True for failures that require the user to sign in again.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::HttpStatus(403) | FailureKind::Unauthorized
        )
    }
}
