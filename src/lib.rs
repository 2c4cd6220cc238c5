//! # Call Limiter
//! Wrappers that limit how often a function runs when it is triggered over and over, e.g. by
//! UI events or file-system notifications:
//!
//! * [`debounce`] - wait for a quiet period, then run once with the latest arguments.
//! * [`throttle`] - run immediately, then drop calls until the interval has passed.
//! * [`dynamic`] - run every call after a delay that grows with the time since the last
//!   execution, clamped between a base and a maximum.
//!
//! Each wrapper owns its own timing state; wrapping the same function twice gives two
//! independent wrappers. Time comes from a [`Scheduler`]: [`TokioScheduler`] by default, or
//! [`ManualScheduler`] for a clock you move by hand.
//!
//! # Example
//! Here, five calls arrive 10ms apart. The debounced function runs once, 100ms after the last
//! call, with the last call's argument. The throttled one runs for the first call only.
//! ```
//! # use std::sync::{Arc, Mutex};
//! # use std::time::Duration;
//! # use call_limiter::{debounce, throttle};
//! # use tokio::time::{sleep, Instant};
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//!     let start = Instant::now();
//!     let seen = Arc::new(Mutex::new(vec![]));
//!
//!     let log = seen.clone();
//!     let debounced = debounce(
//!         move |n: u32| log.lock().unwrap().push(("debounced", n, Instant::now() - start)),
//!         Duration::from_millis(100),
//!     );
//!     let log = seen.clone();
//!     let throttled = throttle(
//!         move |n: u32| log.lock().unwrap().push(("throttled", n, Instant::now() - start)),
//!         Duration::from_millis(100),
//!     );
//!
//!     for n in 0..5 {
//!         debounced.call(n);
//!         throttled.call(n);
//!         sleep(Duration::from_millis(10)).await;
//!     }
//!     sleep(Duration::from_millis(100)).await;
//!
//!     assert_eq!(
//!         *seen.lock().unwrap(),
//!         vec![
//!             ("throttled", 0, Duration::ZERO),
//!             ("debounced", 4, Duration::from_millis(140)),
//!         ]
//!     );
//! # }
//! ```
//!
//! # Limitations
//! Pending executions cannot be cancelled by the caller. Panics in the wrapped function are not
//! caught: a throttled call panics in the caller, a deferred call panics inside the timer task.

mod debounce;
mod dynamic;
mod error;
mod manual_scheduler;
mod scheduler;
mod throttle;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use debounce::Debounced;
pub use dynamic::{adaptive_wait, Dynamic, DynamicOptions};
pub use error::{Error, Result};
pub use manual_scheduler::{ManualScheduler, ManualTimer};
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler, TokioTimer};
pub use throttle::Throttled;

pub(crate) type WrappedFn<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Wrapped functions run without our locks held, so a poisoned lock still holds
/// consistent state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Debounce `f` on the current tokio runtime. See [`Debounced`].
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn debounce<A, F>(f: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced::new(f, wait)
}

/// Throttle `f` against the clock of the current tokio runtime. See [`Throttled`].
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn throttle<A, F>(f: F, wait: Duration) -> Throttled<A>
where
    F: Fn(A) + Send + Sync + 'static,
{
    Throttled::new(f, wait)
}

/// Wrap `f` with an adaptive delay on the current tokio runtime. See [`Dynamic`].
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn dynamic<A, F>(f: F, options: DynamicOptions) -> Dynamic<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Dynamic::new(f, options)
}
