//! `sheetq simulate` – exercise the queue against a synthetic flaky remote.
//!
//! Each simulated call sleeps for `--latency-ms`, fails `--failures` times with
//! `--fail-status`, then succeeds. Useful for eyeballing admission order,
//! concurrency and backoff with a given config.

use anyhow::Result;
use clap::Args;
use sheetq_core::config::SheetqConfig;
use sheetq_core::{QueueConfig, RemoteError, RequestQueue, SubmitOptions};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Number of requests to submit.
    #[arg(long, default_value = "6", value_name = "N")]
    pub requests: usize,

    /// HTTP status each failing attempt reports (e.g. 429, 500, 403).
    #[arg(long, default_value = "503", value_name = "STATUS")]
    pub fail_status: u16,

    /// Failing attempts per request before it succeeds.
    #[arg(long, default_value = "1", value_name = "F")]
    pub failures: u32,

    /// Priorities assigned round-robin to the submitted requests.
    #[arg(long, value_delimiter = ',', default_value = "0", allow_hyphen_values = true)]
    pub priorities: Vec<i32>,

    /// Retry budget per request (defaults to the configured retry_attempts).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Simulated latency of every attempt.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub latency_ms: u64,

    /// Override the configured concurrency limit.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override the configured base backoff delay.
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Print a JSON summary instead of a table.
    #[arg(long)]
    pub json: bool,
}

struct Outcome {
    index: usize,
    priority: i32,
    started: usize,
    attempts: u32,
    /// Time from the first submission until this request's last attempt ended.
    elapsed: Duration,
    error: Option<String>,
}

pub async fn run_simulate(cfg: &SheetqConfig, args: &SimulateArgs) -> Result<()> {
    let (outcomes, queue) = simulate(cfg, args).await;
    if args.json {
        print_json(&outcomes, &queue)?;
    } else {
        print_table(&outcomes, &queue);
    }
    Ok(())
}

async fn simulate(cfg: &SheetqConfig, args: &SimulateArgs) -> (Vec<Outcome>, RequestQueue) {
    let mut queue_cfg = QueueConfig::from(cfg);
    if let Some(limit) = args.concurrency {
        queue_cfg.concurrency_limit = limit;
    }
    if let Some(ms) = args.base_delay_ms {
        queue_cfg.retry.base_delay = Duration::from_millis(ms);
    }
    let queue = RequestQueue::new(queue_cfg);

    let start = Instant::now();
    let start_seq = Arc::new(AtomicUsize::new(0));
    let latency = Duration::from_millis(args.latency_ms);
    let priorities = if args.priorities.is_empty() {
        vec![0]
    } else {
        args.priorities.clone()
    };

    let mut pending = Vec::with_capacity(args.requests);
    for index in 0..args.requests {
        let priority = priorities[index % priorities.len()];
        let attempts = Arc::new(AtomicU32::new(0));
        let started = Arc::new(AtomicUsize::new(usize::MAX));
        let finished_us = Arc::new(AtomicU64::new(0));
        let call = {
            let attempts = Arc::clone(&attempts);
            let started = Arc::clone(&started);
            let finished_us = Arc::clone(&finished_us);
            let start_seq = Arc::clone(&start_seq);
            let (failures, status) = (args.failures, args.fail_status);
            move || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt == 0 {
                    started.store(start_seq.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
                }
                let finished_us = Arc::clone(&finished_us);
                async move {
                    tokio::time::sleep(latency).await;
                    // The last attempt to end is the one that settles the request.
                    let ended = start.elapsed().as_micros().min(u128::from(u64::MAX)) as u64;
                    finished_us.store(ended, Ordering::SeqCst);
                    if attempt < failures {
                        Err(RemoteError::infer(Some(status), "simulated failure"))
                    } else {
                        Ok(index)
                    }
                }
            }
        };
        let mut options = SubmitOptions::with_priority(priority);
        options.retries = args.retries;
        let ticket = queue.submit(call, options);
        pending.push((index, priority, attempts, started, finished_us, ticket));
    }

    let status = queue.status();
    tracing::info!(
        waiting = status.waiting_count,
        active = status.active_count,
        "simulation submitted {} request(s)",
        args.requests
    );

    let mut outcomes = Vec::with_capacity(pending.len());
    for (index, priority, attempts, started, finished_us, ticket) in pending {
        let result = ticket.await;
        outcomes.push(Outcome {
            index,
            priority,
            started: started.load(Ordering::SeqCst),
            attempts: attempts.load(Ordering::SeqCst),
            elapsed: Duration::from_micros(finished_us.load(Ordering::SeqCst)),
            error: result.err().map(|e| e.to_string()),
        });
    }
    (outcomes, queue)
}

fn print_table(outcomes: &[Outcome], queue: &RequestQueue) {
    println!(
        "{:<6} {:<9} {:<6} {:<9} {:<10} {}",
        "REQ", "PRIORITY", "START", "ATTEMPTS", "ELAPSED", "RESULT"
    );
    for o in outcomes {
        println!(
            "{:<6} {:<9} {:<6} {:<9} {:<10} {}",
            o.index,
            o.priority,
            o.started,
            o.attempts,
            format!("{}ms", o.elapsed.as_millis()),
            o.error.as_deref().unwrap_or("ok")
        );
    }
    let status = queue.status();
    println!(
        "queue: {} waiting, {} active, limit {}",
        status.waiting_count, status.active_count, status.concurrency_limit
    );
}

fn print_json(outcomes: &[Outcome], queue: &RequestQueue) -> Result<()> {
    let requests: Vec<_> = outcomes
        .iter()
        .map(|o| {
            serde_json::json!({
                "index": o.index,
                "priority": o.priority,
                "start_order": o.started,
                "attempts": o.attempts,
                "elapsed_ms": o.elapsed.as_millis() as u64,
                "error": o.error,
            })
        })
        .collect();
    let summary = serde_json::json!({
        "requests": requests,
        "status": queue.status(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(requests: usize, priorities: &[i32]) -> SimulateArgs {
        SimulateArgs {
            requests,
            fail_status: 503,
            failures: 0,
            priorities: priorities.to_vec(),
            retries: None,
            latency_ms: 100,
            concurrency: Some(1),
            base_delay_ms: Some(10),
            json: false,
        }
    }

    fn ms(d: Duration) -> u128 {
        d.as_millis()
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_reflects_settlement_not_report_order() {
        let (outcomes, queue) = simulate(&SheetqConfig::default(), &args(3, &[0, 1, 5])).await;

        let starts: Vec<_> = outcomes.iter().map(|o| o.started).collect();
        assert_eq!(starts, vec![0, 2, 1]);

        // Request 2 (priority 5) runs second and finishes well before request 1.
        assert!((100..=102).contains(&ms(outcomes[0].elapsed)));
        assert!((200..=203).contains(&ms(outcomes[2].elapsed)));
        assert!((300..=304).contains(&ms(outcomes[1].elapsed)));
        assert!(outcomes.iter().all(|o| o.error.is_none() && o.attempts == 1));
        assert!(queue.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_retried_and_reported() {
        let mut a = args(2, &[0]);
        a.failures = 1;
        let (outcomes, _) = simulate(&SheetqConfig::default(), &a).await;
        assert!(outcomes.iter().all(|o| o.attempts == 2 && o.error.is_none()));

        a.fail_status = 403;
        let (outcomes, _) = simulate(&SheetqConfig::default(), &a).await;
        for o in &outcomes {
            assert_eq!(o.attempts, 1);
            assert!(o.error.as_deref().is_some_and(|e| e.contains("HTTP 403")));
        }
    }
}
