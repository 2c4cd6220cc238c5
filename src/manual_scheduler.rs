use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::lock;
use crate::scheduler::{Scheduler, TimerHandle};

type Callback = Box<dyn FnOnce() + Send>;

/// Timers are ordered by deadline, then by the order they were scheduled in.
type TimerKey = (Duration, u64);

#[derive(Default)]
struct Clock {
    origin_millis: u64,
    elapsed: Duration,
    next_seq: u64,
    timers: BTreeMap<TimerKey, Callback>,
}

/// A clock that only moves when told to.
///
/// Time starts at `origin` milliseconds since the epoch and is moved forward
/// with [`advance`](ManualScheduler::advance), which runs every timer that
/// comes due on the way. Clones share the same clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<Clock>>,
}

impl ManualScheduler {
    /// A clock reading 0 ms since the epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock reading `origin_millis` ms since the epoch.
    pub fn starting_at(origin_millis: u64) -> Self {
        Self {
            clock: Arc::new(Mutex::new(Clock {
                origin_millis,
                ..Clock::default()
            })),
        }
    }

    /// Move the clock forward by `by`, running due timers in deadline order.
    ///
    /// While a timer runs the clock reads that timer's deadline. Timers that a
    /// callback schedules inside the window run during this same call. A panic
    /// in a callback propagates out of here, with the clock left at that
    /// callback's deadline.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.clock).elapsed.saturating_add(by);

        loop {
            let due = {
                let mut clock = lock(&self.clock);
                match clock.timers.first_entry() {
                    Some(entry) if entry.key().0 <= target => {
                        let ((deadline, _), callback) = entry.remove_entry();
                        clock.elapsed = clock.elapsed.max(deadline);
                        callback
                    }
                    _ => break,
                }
            };
            due();
        }

        let mut clock = lock(&self.clock);
        clock.elapsed = clock.elapsed.max(target);
    }

    /// Time passed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        lock(&self.clock).elapsed
    }

    /// Number of timers scheduled and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        lock(&self.clock).timers.len()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = lock(&self.clock);
        f.debug_struct("ManualScheduler")
            .field("origin_millis", &clock.origin_millis)
            .field("elapsed", &clock.elapsed)
            .field("pending", &clock.timers.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTimer;

    fn now_millis(&self) -> u64 {
        let clock = lock(&self.clock);
        clock.origin_millis + clock.elapsed.as_millis() as u64
    }

    fn schedule_once<F>(&self, delay: Duration, f: F) -> ManualTimer
    where
        F: FnOnce() + Send + 'static,
    {
        let mut clock = lock(&self.clock);
        let key = (clock.elapsed.saturating_add(delay), clock.next_seq);
        clock.next_seq += 1;
        clock.timers.insert(key, Box::new(f));

        ManualTimer {
            key,
            clock: Arc::downgrade(&self.clock),
        }
    }
}

/// A timer on a [`ManualScheduler`].
#[derive(Debug)]
pub struct ManualTimer {
    key: TimerKey,
    clock: Weak<Mutex<Clock>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(self) {
        if let Some(clock) = self.clock.upgrade() {
            lock(&clock).timers.remove(&self.key);
        }
    }
}
