//! Retry loop: run an async call until success or the policy says stop.

use std::future::Future;

use super::classify::Classify;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `call` until it succeeds, fails terminally, or `budget` retries are used.
///
/// On retryable failure, sleeps for the backoff duration then tries again.
/// The final error is returned exactly as the call produced it.
pub async fn run_with_retry<T, E, F, Fut>(policy: &RetryPolicy, budget: u32, mut call: F) -> Result<T, E>
where
    E: Classify + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, budget, e.failure_kind()) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        "request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt + 1,
                        budget.saturating_add(1),
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
