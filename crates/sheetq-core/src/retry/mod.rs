//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (authorization, throttling,
//! server errors, transport failures) and exponential backoff decisions so the
//! request queue and any direct callers share a consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, infer_kind, Classification, Classify};
pub use error::{FailureKind, RemoteError};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
