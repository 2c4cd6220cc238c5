use call_limiter::{throttle, Throttled, TokioScheduler};

use futures::future::join_all;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Barrier;
use tokio::time::{advance, sleep, Instant};

/// Calls at t=0, t=50 and t=150 with a 100ms wait run at t=0 and t=150 only.
#[tokio::test(start_paused = true)]
async fn test_limits_calls_to_once_per_wait() {
    let start = Instant::now();
    let calls = Arc::new(Mutex::new(vec![]));
    let recorded = calls.clone();
    let throttled = throttle(
        move |n: u32| recorded.lock().unwrap().push((n, Instant::now() - start)),
        Duration::from_millis(100),
    );

    assert!(throttled.call(0));
    advance(Duration::from_millis(50)).await;
    assert!(!throttled.call(50));
    advance(Duration::from_millis(100)).await;
    assert!(throttled.call(150));

    // The dropped call never turns up later.
    sleep(Duration::from_millis(500)).await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![(0, Duration::ZERO), (150, Duration::from_millis(150))]
    );
}

/// The first call runs synchronously, before `call` returns.
#[tokio::test(start_paused = true)]
async fn test_runs_in_caller() {
    let ran = Arc::new(Mutex::new(false));
    let flag = ran.clone();
    let throttled = throttle(move |()| *flag.lock().unwrap() = true, Duration::from_secs(1));

    throttled.call(());
    assert!(*ran.lock().unwrap());
}

/// A panic in the wrapped function reaches the caller and does not start the cooldown.
#[tokio::test(start_paused = true)]
async fn test_panic_propagates_without_cooldown() {
    let throttled = throttle(
        |explode: bool| {
            if explode {
                panic!("boom");
            }
        },
        Duration::from_secs(1),
    );

    let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| throttled.call(true)));
    assert!(caught.is_err());
    assert!(throttled.call(false));
    assert!(!throttled.call(false));
}

/// Ten tasks on worker threads hit the same throttled function while it is still running,
/// and it runs a single time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers() {
    let count = Arc::new(Mutex::new(0));
    let counter = count.clone();
    let throttled = Throttled::with_scheduler(
        move |()| {
            *counter.lock().unwrap() += 1;
            std::thread::sleep(Duration::from_millis(20));
        },
        Duration::from_secs(60),
        TokioScheduler::from_handle(Handle::current()),
    );
    let barrier = Arc::new(Barrier::new(10));

    let mut handles = vec![];
    for _ in 0..10 {
        let throttled = throttled.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            throttled.call(())
        }));
    }

    let accepted = join_all(handles)
        .await
        .into_iter()
        .filter(|result| matches!(result, Ok(true)))
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(*count.lock().unwrap(), 1);
}

/// Two wrappers around the same function have separate cooldowns.
#[tokio::test(start_paused = true)]
async fn test_instances_are_independent() {
    let count = Arc::new(Mutex::new(0));
    let f = {
        let count = count.clone();
        move |()| *count.lock().unwrap() += 1
    };
    let first = throttle(f.clone(), Duration::from_secs(1));
    let second = throttle(f, Duration::from_secs(1));

    assert!(first.call(()));
    assert!(second.call(()));
    assert!(!first.call(()));
    assert!(!second.call(()));
    assert_eq!(*count.lock().unwrap(), 2);
}
