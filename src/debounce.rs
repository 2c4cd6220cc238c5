//! Collapse a burst of calls into one trailing execution.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace};

use crate::scheduler::{Scheduler, TimerHandle, TokioScheduler};
use crate::{lock, WrappedFn};

/// The newest scheduled execution. `generation` tells a firing timer whether it
/// is still the newest one.
struct Pending<H> {
    generation: u64,
    timer: Option<H>,
}

struct Inner<A, S: Scheduler> {
    f: WrappedFn<A>,
    wait: Duration,
    scheduler: S,
    pending: Mutex<Pending<S::Handle>>,
}

/// Runs the wrapped function `wait` after the last call of a burst, with that
/// call's arguments.
///
/// Every call cancels the execution scheduled by the previous one, so at most
/// one execution is ever pending. Clones share the same pending execution.
pub struct Debounced<A, S: Scheduler = TokioScheduler> {
    inner: Arc<Inner<A, S>>,
}

impl<A: Send + 'static> Debounced<A> {
    /// Debounce `f` on the current tokio runtime.
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

impl<A: Send + 'static, S: Scheduler> Debounced<A, S> {
    /// Debounce `f`, scheduling its executions on `scheduler`.
    pub fn with_scheduler<F>(f: F, wait: Duration, scheduler: S) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        debug!("debounce: wrapping function with wait {:?}", wait);
        Self {
            inner: Arc::new(Inner {
                f: Arc::new(f),
                wait,
                scheduler,
                pending: Mutex::new(Pending {
                    generation: 0,
                    timer: None,
                }),
            }),
        }
    }

    /// Replace any pending execution with one of `f(args)`, `wait` from now.
    pub fn call(&self, args: A) {
        let mut pending = lock(&self.inner.pending);
        if let Some(timer) = pending.timer.take() {
            trace!("debounce: superseding pending execution");
            timer.cancel();
        }

        pending.generation = pending.generation.wrapping_add(1);
        let generation = pending.generation;
        let f = Arc::clone(&self.inner.f);
        let state = Arc::downgrade(&self.inner);

        let timer = self.inner.scheduler.schedule_once(self.inner.wait, move || {
            if let Some(inner) = state.upgrade() {
                let mut pending = lock(&inner.pending);
                if pending.generation == generation {
                    pending.timer = None;
                }
            }
            f(args);
        });
        pending.timer = Some(timer);
    }

    /// Whether an execution is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        lock(&self.inner.pending).timer.is_some()
    }
}

impl<A, S: Scheduler> Clone for Debounced<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, S: Scheduler> fmt::Debug for Debounced<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("wait", &self.inner.wait)
            .finish_non_exhaustive()
    }
}
