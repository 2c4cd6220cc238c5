//! The timing capability every wrapper is built on.
//!
//! A [`Scheduler`] answers two questions: what time is it, and "run this once,
//! later". Wrappers never touch the system clock or spawn tasks themselves, so
//! the same wrapper runs against a real tokio runtime ([`TokioScheduler`]) or a
//! hand-driven clock ([`ManualScheduler`](crate::ManualScheduler)).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Result;

/// A fire-once timer that has been scheduled but may not have run yet.
pub trait TimerHandle: Send + 'static {
    /// Stop the timer from firing. Does nothing if it already fired.
    fn cancel(self);
}

/// Source of the current time and of fire-once timers.
pub trait Scheduler: Send + Sync + 'static {
    type Handle: TimerHandle;

    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64;

    /// Run `f` once, `delay` from now.
    ///
    /// `f` is never run from inside this call, even when `delay` is zero.
    fn schedule_once<F>(&self, delay: Duration, f: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static;
}

/// Schedules timers as tasks on a tokio runtime.
///
/// Time is read from the runtime's clock, so a paused test clock
/// (`#[tokio::test(start_paused = true)]`) drives every wrapper built on it.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    runtime: Handle,
    epoch_millis: u64,
    anchor: Instant,
}

impl TokioScheduler {
    /// Use the runtime we are currently running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime, like `tokio::spawn`.
    /// Use [`TokioScheduler::try_current`] to get an error instead.
    pub fn current() -> Self {
        Self::from_handle(Handle::current())
    }

    /// Use the runtime we are currently running on, if there is one.
    pub fn try_current() -> Result<Self> {
        Ok(Self::from_handle(Handle::try_current()?))
    }

    /// Use the runtime behind `runtime`, from any thread.
    pub fn from_handle(runtime: Handle) -> Self {
        // Entering makes `Instant::now` read this runtime's (possibly paused) clock.
        let anchor = {
            let _guard = runtime.enter();
            Instant::now()
        };
        // A clock set before 1970 anchors at zero.
        let epoch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since_epoch| since_epoch.as_millis() as u64)
            .unwrap_or_default();

        Self {
            runtime,
            epoch_millis,
            anchor,
        }
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioTimer;

    fn now_millis(&self) -> u64 {
        let _guard = self.runtime.enter();
        self.epoch_millis + self.anchor.elapsed().as_millis() as u64
    }

    fn schedule_once<F>(&self, delay: Duration, f: F) -> TokioTimer
    where
        F: FnOnce() + Send + 'static,
    {
        let _guard = self.runtime.enter();
        // Build the sleep here so the deadline is measured from the call, not from
        // whenever the task first gets polled.
        let sleep = tokio::time::sleep(delay);
        TokioTimer(self.runtime.spawn(async move {
            sleep.await;
            f();
        }))
    }
}

/// A timer task on a tokio runtime. Cancelling aborts the task.
///
/// Dropping the handle leaves the timer running.
#[derive(Debug)]
pub struct TokioTimer(JoinHandle<()>);

impl TokioTimer {
    /// Whether the timer task has run to completion, panicked, or been aborted.
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl TimerHandle for TokioTimer {
    fn cancel(self) {
        self.0.abort();
    }
}
