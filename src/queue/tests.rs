//! Tests for the dispatch queue

use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_tasks_start_in_submission_order_with_gap() {
    let queue = SerialQueue::new(Duration::from_millis(100));
    let starts: Arc<Mutex<Vec<(usize, Instant)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut pending = Vec::new();
    for i in 0..3 {
        let starts = Arc::clone(&starts);
        pending.push(queue.run(move || async move {
            starts.lock().unwrap().push((i, Instant::now()));
        }));
    }

    for outcome in join_all(pending).await {
        outcome.unwrap();
    }

    let starts = starts.lock().unwrap();
    let order: Vec<usize> = starts.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2]);

    // Instantaneous tasks under a paused clock: starts at ~0ms, ~100ms, ~200ms.
    assert!(starts[1].1 - starts[0].1 >= Duration::from_millis(100));
    assert!(starts[2].1 - starts[1].1 >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_execution_windows_never_overlap() {
    let queue = SerialQueue::new(Duration::from_millis(10));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicBool::new(false));

    let mut pending = Vec::new();
    for _ in 0..8 {
        let in_flight = Arc::clone(&in_flight);
        let overlapped = Arc::clone(&overlapped);
        pending.push(queue.run(move || async move {
            if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    join_all(pending).await;
    assert!(!overlapped.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_failing_task_does_not_stop_the_queue() {
    let queue = SerialQueue::new(Duration::from_millis(10));

    let failing = queue.run(|| async { Err::<(), &str>("boom") });
    let healthy = queue.run(|| async { Ok::<u32, &str>(7) });

    // The queue settles both; only the task's own outcome carries the failure.
    assert_eq!(failing.await.unwrap(), Err("boom"));
    assert_eq!(healthy.await.unwrap(), Ok(7));
}

#[tokio::test(start_paused = true)]
async fn test_outcome_passthrough() {
    let queue = SerialQueue::with_default_delay();

    let value = queue.run(|| async { "payload".to_string() }).await.unwrap();
    assert_eq!(value, "payload");
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_happens_at_call_time() {
    let queue = SerialQueue::new(Duration::from_millis(10));
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let log = Arc::clone(&log);
        queue.run(move || async move {
            log.lock().unwrap().push("first");
        })
    };
    let second = {
        let log = Arc::clone(&log);
        queue.run(move || async move {
            log.lock().unwrap().push("second");
        })
    };

    // Awaiting out of order does not reorder execution.
    second.await.unwrap();
    first.await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test(start_paused = true)]
async fn test_queued_tasks_drain_after_queue_drop() {
    let queue = SerialQueue::new(Duration::from_millis(10));
    let ran = Arc::new(AtomicUsize::new(0));

    let pending: Vec<_> = (0..3)
        .map(|_| {
            let ran = Arc::clone(&ran);
            queue.run(move || async move {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    drop(queue);

    for outcome in join_all(pending).await {
        outcome.unwrap();
    }
    assert_eq!(ran.load(Ordering::SeqCst), 3);
}
