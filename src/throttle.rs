//! Leading-edge throttling: run at once, then ignore calls until `wait` has passed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use crate::scheduler::{Scheduler, TokioScheduler};
use crate::WrappedFn;

struct Inner<A, S> {
    f: WrappedFn<A>,
    wait: Duration,
    scheduler: S,
    /// Milliseconds since the epoch of the last execution. Zero until one happens.
    last_execution: AtomicU64,
}

/// Runs the wrapped function immediately, at most once per `wait`.
///
/// Calls inside the cooldown are dropped: nothing is queued and nothing runs
/// later on their behalf. Clones share the same cooldown.
pub struct Throttled<A, S = TokioScheduler> {
    inner: Arc<Inner<A, S>>,
}

impl<A> Throttled<A> {
    /// Throttle `f` against the clock of the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new<F>(f: F, wait: Duration) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_scheduler(f, wait, TokioScheduler::current())
    }
}

impl<A, S: Scheduler> Throttled<A, S> {
    /// Throttle `f` against the clock of `scheduler`.
    pub fn with_scheduler<F>(f: F, wait: Duration, scheduler: S) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        debug!("throttle: wrapping function with wait {:?}", wait);
        Self {
            inner: Arc::new(Inner {
                f: Arc::new(f),
                wait,
                scheduler,
                last_execution: AtomicU64::new(0),
            }),
        }
    }

    /// Run `f(args)` now if the cooldown is over, otherwise drop the call.
    ///
    /// Returns whether `f` ran. The window is claimed before `f` runs, so callers
    /// on other threads are dropped while it is running. If `f` panics the panic
    /// reaches the caller and the claim is given back.
    pub fn call(&self, args: A) -> bool {
        let now = self.inner.scheduler.now_millis();
        let last = self.inner.last_execution.load(Ordering::Acquire);

        // A clock that went backwards counts as still cooling down.
        let ready = now
            .checked_sub(last)
            .is_some_and(|elapsed| Duration::from_millis(elapsed) >= self.inner.wait);
        if !ready {
            trace!(
                "throttle: dropping call, {}ms since last execution",
                now.saturating_sub(last)
            );
            return false;
        }

        if self
            .inner
            .last_execution
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("throttle: dropping call, window taken by another caller");
            return false;
        }

        let _claim = Claim {
            last_execution: &self.inner.last_execution,
            claimed: now,
            previous: last,
        };
        (self.inner.f)(args);
        true
    }
}

/// Hands a claimed window back if the wrapped function unwinds.
struct Claim<'a> {
    last_execution: &'a AtomicU64,
    claimed: u64,
    previous: u64,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            // Only undo our own claim; a later one stays.
            let _ = self.last_execution.compare_exchange(
                self.claimed,
                self.previous,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }
}

impl<A, S> Clone for Throttled<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, S> fmt::Debug for Throttled<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("wait", &self.inner.wait)
            .field(
                "last_execution",
                &self.inner.last_execution.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}
