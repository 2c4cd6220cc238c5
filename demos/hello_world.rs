//! Fire a burst of "keystrokes" with random gaps at all three wrappers and print when each
//! wrapped function actually runs.

use call_limiter::{debounce, dynamic, throttle, DynamicOptions};

use std::time::Duration;

use rand::{thread_rng, Rng};
use tokio::time::{sleep, Instant};

#[tokio::main]
async fn main() {
    let start = Instant::now();

    let debounced = debounce(
        move |key: char| println!("debounced {:?} at {:?}", key, Instant::now() - start),
        Duration::from_millis(150),
    );
    let throttled = throttle(
        move |key: char| println!("throttled {:?} at {:?}", key, Instant::now() - start),
        Duration::from_millis(150),
    );
    let dynamic = dynamic(
        move |key: char| println!("dynamic   {:?} at {:?}", key, Instant::now() - start),
        DynamicOptions::new(Duration::from_millis(50), Duration::from_millis(400)),
    );

    let mut rng = thread_rng();

    for key in "hello world".chars() {
        debounced.call(key);
        throttled.call(key);
        let wait = dynamic.call(key);
        println!("pressed   {:?} at {:?} (dynamic wait {:?})", key, Instant::now() - start, wait);

        let gap: u64 = rng.gen_range(20..120);
        sleep(Duration::from_millis(gap)).await;
    }

    // Let the trailing executions land.
    sleep(Duration::from_millis(500)).await;
}
