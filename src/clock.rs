use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A second-resolution source of wall-clock time.
///
/// Counters read their clock exactly once per operation, so substituting a
/// manual implementation lets bucket transitions be exercised without real
/// delays.
pub trait Clock {
    /// Whole seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

/// The real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A hand-driven clock for tests and simulations.
///
/// Clones share the same underlying time, so a clock handed to a counter
/// can still be stepped from the outside.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(secs: i64) -> Self {
        Self(Arc::new(AtomicI64::new(secs)))
    }

    /// Moves the clock to an absolute second.
    #[inline]
    pub fn set(&self, secs: i64) {
        self.0.store(secs, Ordering::SeqCst);
    }

    /// Steps the clock forward.
    #[inline]
    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_secs(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
