use super::*;
use crate::retry::RemoteError;
use std::sync::atomic::{AtomicU32, AtomicUsize};
use std::time::Duration;
use tokio::sync::Notify;

fn fast_queue(limit: usize) -> RequestQueue {
    RequestQueue::new(QueueConfig {
        concurrency_limit: limit,
        retry_attempts: 3,
        retry: RetryPolicy {
            base_delay: Duration::from_millis(10),
            jitter_ratio: 0.3,
        },
    })
}

/// Submit a call that blocks until `gate` is notified.
fn gated(queue: &RequestQueue, gate: &Arc<Notify>, value: u32) -> Ticket<u32, RemoteError> {
    let gate = Arc::clone(gate);
    queue.submit(
        move || {
            let gate = Arc::clone(&gate);
            async move {
                gate.notified().await;
                Ok::<_, RemoteError>(value)
            }
        },
        SubmitOptions::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn active_count_never_exceeds_limit() {
    let queue = fast_queue(3);
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tickets: Vec<_> = (0..10u32)
        .map(|i| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            queue.submit(
                move || {
                    let current = Arc::clone(&current);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50 + u64::from(i) * 7)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, RemoteError>(i)
                    }
                },
                SubmitOptions::default(),
            )
        })
        .collect();

    let status = queue.status();
    assert_eq!(status.active_count, 3);
    assert_eq!(status.waiting_count, 7);
    assert_eq!(status.concurrency_limit, 3);

    for (i, ticket) in tickets.into_iter().enumerate() {
        assert_eq!(ticket.await.unwrap(), i as u32);
    }
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert!(queue.status().is_idle());
}

#[tokio::test]
async fn admits_highest_priority_then_submission_order() {
    let queue = fast_queue(1);
    let gate = Arc::new(Notify::new());
    let blocker = gated(&queue, &gate, 0);

    let order = Arc::new(Mutex::new(Vec::new()));
    let tickets: Vec<_> = [(1, "p1"), (5, "p5"), (3, "p3a"), (3, "p3b")]
        .into_iter()
        .map(|(priority, label)| {
            let order = Arc::clone(&order);
            queue.submit(
                move || {
                    order.lock().unwrap().push(label);
                    std::future::ready(Ok::<_, RemoteError>(()))
                },
                SubmitOptions::with_priority(priority),
            )
        })
        .collect();
    assert_eq!(queue.status().waiting_count, 4);

    gate.notify_one();
    blocker.await.unwrap();
    for t in tickets {
        t.await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec!["p5", "p3a", "p3b", "p1"]);
}

#[tokio::test(start_paused = true)]
async fn retryable_failure_exhausts_explicit_budget() {
    let queue = fast_queue(3);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let res: Result<(), _> = queue
        .submit(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(RemoteError::http(500, "internal")))
            },
            SubmitOptions::default().retries(2),
        )
        .await;
    let err = res.unwrap_err();
    assert_eq!(err.failure().and_then(RemoteError::status), Some(500));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn default_budget_comes_from_config() {
    let queue = fast_queue(1);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let res: Result<(), _> = queue
        .submit(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(RemoteError::network("Failed to fetch")))
            },
            SubmitOptions::default(),
        )
        .await;
    assert!(res.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn forbidden_is_not_retried() {
    let queue = fast_queue(3);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let start = tokio::time::Instant::now();
    let res: Result<(), _> = queue
        .submit(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(RemoteError::http(403, "forbidden")))
            },
            SubmitOptions::default().retries(10),
        )
        .await;
    assert_eq!(res.unwrap_err().into_failure(), Some(RemoteError::http(403, "forbidden")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_call_is_retried() {
    let queue = fast_queue(3);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let res = queue
        .submit(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if n == 0 {
                    Err(RemoteError::http(429, "rate limited"))
                } else {
                    Ok("rows")
                })
            },
            SubmitOptions::default(),
        )
        .await;
    assert_eq!(res.unwrap(), "rows");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn clear_cancels_waiting_but_not_active() {
    let queue = fast_queue(1);
    let gate = Arc::new(Notify::new());
    let active = gated(&queue, &gate, 1);
    let waiting_a = gated(&queue, &gate, 2);
    let waiting_b = gated(&queue, &gate, 3);

    let status = queue.status();
    assert_eq!((status.active_count, status.waiting_count), (1, 2));

    assert_eq!(queue.clear(), 2);
    assert!(waiting_a.await.unwrap_err().is_cleared());
    assert!(waiting_b.await.unwrap_err().is_cleared());

    let status = queue.status();
    assert_eq!((status.active_count, status.waiting_count), (1, 0));

    gate.notify_one();
    assert_eq!(active.await.unwrap(), 1);
    assert_eq!(queue.clear(), 0);
    assert!(queue.status().is_idle());
}

#[tokio::test]
async fn dropped_ticket_still_runs_and_frees_slot() {
    let queue = fast_queue(1);
    let ran = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ran);
    drop(queue.submit(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<_, RemoteError>(()))
        },
        SubmitOptions::default(),
    ));
    let next = queue.submit(
        || std::future::ready(Ok::<_, RemoteError>(7)),
        SubmitOptions::default(),
    );
    assert_eq!(next.await.unwrap(), 7);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_call_is_abandoned_and_releases_slot() {
    let queue = fast_queue(1);
    let doomed = queue.submit(
        || async {
            if true {
                panic!("call exploded");
            }
            Ok::<u32, RemoteError>(0)
        },
        SubmitOptions::default(),
    );
    let after = queue.submit(
        || std::future::ready(Ok::<_, RemoteError>(2)),
        SubmitOptions::default(),
    );
    assert!(matches!(doomed.await, Err(RequestError::Abandoned)));
    assert_eq!(after.await.unwrap(), 2);
}

#[tokio::test]
async fn request_ids_are_unique_and_increasing() {
    let queue = fast_queue(2);
    let a = queue.submit(|| std::future::ready(Ok::<_, RemoteError>(())), SubmitOptions::default());
    let b = queue.submit(|| std::future::ready(Ok::<_, RemoteError>(())), SubmitOptions::default());
    assert!(a.id() < b.id());
    a.await.unwrap();
    b.await.unwrap();
}

#[test]
fn zero_concurrency_limit_is_clamped() {
    let queue = RequestQueue::new(QueueConfig {
        concurrency_limit: 0,
        ..QueueConfig::default()
    });
    assert_eq!(queue.status().concurrency_limit, 1);
    assert_eq!(queue.config().retry_attempts, 3);
}

#[test]
fn runtime_shutdown_with_long_backlog_does_not_overflow() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let queue = fast_queue(1);
    let tickets: Vec<_> = {
        let _enter = rt.enter();
        (0..5_000)
            .map(|_| {
                queue.submit(
                    || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok::<_, RemoteError>(())
                    },
                    SubmitOptions::default(),
                )
            })
            .collect()
    };
    assert_eq!(queue.status().waiting_count, 4_999);

    drop(rt);
    assert_eq!(queue.status().active_count, 0);
    drop(queue);

    let check = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    check.block_on(async {
        for ticket in tickets {
            let settled = tokio::time::timeout(Duration::from_secs(5), ticket)
                .await
                .expect("ticket left pending after shutdown");
            assert!(matches!(settled, Err(RequestError::Abandoned)));
        }
    });
}
