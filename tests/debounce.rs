use call_limiter::{debounce, Debounced};

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{advance, sleep, Instant};

type Calls<T> = Arc<Mutex<Vec<(T, Duration)>>>;

/// Build a debounced function that records its argument and when it ran.
fn recording<T: Send + 'static>(wait: Duration) -> (Calls<T>, Debounced<T>) {
    let calls: Calls<T> = Arc::new(Mutex::new(vec![]));
    let start = Instant::now();
    let recorded = calls.clone();
    let debounced = debounce(
        move |args: T| recorded.lock().unwrap().push((args, Instant::now() - start)),
        wait,
    );
    (calls, debounced)
}

/// Two calls back to back run the function once.
#[tokio::test(start_paused = true)]
async fn test_calls_function_once_after_wait() {
    let (calls, debounced) = recording::<()>(Duration::from_millis(100));

    debounced.call(());
    debounced.call(());
    sleep(Duration::from_millis(150)).await;

    assert_eq!(*calls.lock().unwrap(), vec![((), Duration::from_millis(100))]);
}

/// A burst with gaps shorter than the wait fires once, `wait` after the last call,
/// with the last call's arguments.
#[tokio::test(start_paused = true)]
async fn test_burst_fires_with_last_arguments() {
    let (calls, debounced) = recording::<(u32, &'static str)>(Duration::from_millis(100));

    debounced.call((1, "a"));
    advance(Duration::from_millis(40)).await;
    debounced.call((2, "b"));
    advance(Duration::from_millis(99)).await;
    debounced.call((3, "c"));
    assert!(debounced.is_pending());

    sleep(Duration::from_millis(300)).await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![((3, "c"), Duration::from_millis(239))]
    );
    assert!(!debounced.is_pending());
}

/// Nothing runs before the wait is up.
#[tokio::test(start_paused = true)]
async fn test_single_call_not_early() {
    let (calls, debounced) = recording::<u8>(Duration::from_secs(1));

    debounced.call(9);
    sleep(Duration::from_millis(999)).await;
    assert!(calls.lock().unwrap().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(*calls.lock().unwrap(), vec![(9, Duration::from_secs(1))]);
}

/// Two wrappers around the same function keep separate timers.
#[tokio::test(start_paused = true)]
async fn test_instances_are_independent() {
    let calls: Calls<&'static str> = Arc::new(Mutex::new(vec![]));
    let start = Instant::now();
    let f = {
        let calls = calls.clone();
        move |name: &'static str| calls.lock().unwrap().push((name, Instant::now() - start))
    };
    let first = debounce(f.clone(), Duration::from_millis(100));
    let second = debounce(f, Duration::from_millis(100));

    first.call("first");
    advance(Duration::from_millis(50)).await;
    second.call("second");
    sleep(Duration::from_millis(200)).await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            ("first", Duration::from_millis(100)),
            ("second", Duration::from_millis(150)),
        ]
    );
}
