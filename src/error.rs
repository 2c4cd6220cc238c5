use std::time::Duration;

/// Errors produced while setting up a wrapper.
///
/// Calling a wrapper never fails: dropped calls are silent and panics from
/// the wrapped function are left alone.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There is no tokio runtime to schedule timers on.
    #[error("no tokio runtime available to schedule timers: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// `base_wait` is larger than `max_wait`.
    ///
    /// The adaptive formula still yields a value in this case (always
    /// `max_wait`), so this is only reported by [`DynamicOptions::validate`].
    ///
    /// [`DynamicOptions::validate`]: crate::DynamicOptions::validate
    #[error("base wait {base_wait:?} exceeds max wait {max_wait:?}")]
    InvertedBounds {
        base_wait: Duration,
        max_wait: Duration,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
