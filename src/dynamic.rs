//! Trailing execution with a delay that grows with the gap since the last run.
//!
//! Each call schedules its own execution after
//!
//! ```text
//! wait = min(max(base_wait, since_last * 1.2), max_wait)
//! ```
//!
//! where `since_last` is the time since the last *completed* execution. The
//! timestamp is only written when an execution fires, so calls made while
//! earlier ones are still pending all measure against the same stale value and
//! every one of them runs. Nothing is coalesced.
//!
//! The timestamp starts at zero, not at construction time: against a real clock
//! the first call sees a gap of decades and waits `max_wait`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::WrappedFn;

/// Delay added per millisecond of gap: 1.2 ms.
const GROWTH_MICROS_PER_MILLI: u64 = 1_200;

/// Bounds for the adaptive delay of a [`Dynamic`] wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicOptions {
    /// Shortest delay.
    pub base_wait: Duration,
    /// Longest delay.
    pub max_wait: Duration,
}

impl DynamicOptions {
    pub fn new(base_wait: Duration, max_wait: Duration) -> Self {
        Self {
            base_wait,
            max_wait,
        }
    }

    /// Check that `base_wait <= max_wait`.
    ///
    /// Wrappers accept inverted bounds anyway (every delay is then `max_wait`);
    /// this is for callers that would rather reject them up front.
    pub fn validate(&self) -> Result<()> {
        if self.base_wait > self.max_wait {
            return Err(Error::InvertedBounds {
                base_wait: self.base_wait,
                max_wait: self.max_wait,
            });
        }
        Ok(())
    }
}

/// The delay for a call made `since_last_millis` after the last execution.
///
/// Computed exactly in microseconds, with no floating point.
pub fn adaptive_wait(options: &DynamicOptions, since_last_millis: u64) -> Duration {
    let scaled = Duration::from_micros(since_last_millis.saturating_mul(GROWTH_MICROS_PER_MILLI));
    options.base_wait.max(scaled).min(options.max_wait)
}

struct Inner<A, S> {
    f: WrappedFn<A>,
    options: DynamicOptions,
    scheduler: S,
    /// Milliseconds since the epoch at which the last execution finished.
    last_execution: AtomicU64,
}

/// Schedules every call as a trailing execution with an adaptive delay.
///
/// See the [module docs](self) for the formula. Clones share the same
/// last-execution timestamp.
pub struct Dynamic<A, S = TokioScheduler> {
    inner: Arc<Inner<A, S>>,
}

impl<A: Send + 'static> Dynamic<A> {
    /// Wrap `f` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new<F>(f: F, options: DynamicOptions) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_scheduler(f, options, TokioScheduler::current())
    }
}

impl<A: Send + 'static, S: Scheduler> Dynamic<A, S> {
    /// Wrap `f`, scheduling its executions on `scheduler`.
    ///
    /// Inverted bounds are logged and accepted.
    pub fn with_scheduler<F>(f: F, options: DynamicOptions, scheduler: S) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        if let Err(err) = options.validate() {
            warn!("dynamic: {}; every delay will be the max wait", err);
        }
        debug!("dynamic: wrapping function with {:?}", options);

        Self {
            inner: Arc::new(Inner {
                f: Arc::new(f),
                options,
                scheduler,
                last_execution: AtomicU64::new(0),
            }),
        }
    }

    /// Schedule `f(args)` after the adaptive delay, and return that delay.
    pub fn call(&self, args: A) -> Duration {
        let now = self.inner.scheduler.now_millis();
        let since_last = now.saturating_sub(self.inner.last_execution.load(Ordering::Acquire));
        let wait = adaptive_wait(&self.inner.options, since_last);
        trace!(
            "dynamic: {}ms since last execution, scheduling in {:?}",
            since_last,
            wait
        );

        let f = Arc::clone(&self.inner.f);
        let state = Arc::downgrade(&self.inner);
        // Pending executions cannot be cancelled, so the handle is not kept.
        let _ = self.inner.scheduler.schedule_once(wait, move || {
            f(args);
            if let Some(inner) = state.upgrade() {
                let finished = inner.scheduler.now_millis();
                inner.last_execution.store(finished, Ordering::Release);
            }
        });
        wait
    }
}

impl<A, S> Clone for Dynamic<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, S> fmt::Debug for Dynamic<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("options", &self.inner.options)
            .field(
                "last_execution",
                &self.inner.last_execution.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}
