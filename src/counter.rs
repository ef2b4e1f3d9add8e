//! A fixed-memory sliding window event counter.
//!
//! `Counter` keeps one `u32` bucket per second over a bounded trailing
//! window. Each recorded event lands in the bucket for the current
//! wall-clock second; buckets that age out of the window are zeroed lazily,
//! on the next access, rather than by a timer.
//!
//! This allows efficient reporting of:
//! - Total events over the window or a trailing sub-window (`count()`, `count_within()`)
//! - Average event rate (`rate_per_second()`, `rate_per()`)
//! - Activity in the current second (`recent()`)
//!
//! ## Example
//! ```rust,ignore
//! let mut counter = Counter::new(std::time::Duration::from_secs(60))?;
//! counter.incr(); // record an event
//! let total = counter.count(); // events in the last 60 seconds
//! let burst = counter.count_within(std::time::Duration::from_secs(5));
//! ```

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::{Config, DEFAULT_WINDOW};

/// Largest aggregate `count`/`count_within` report before falling back to
/// the [`COUNT_OVERFLOW`] sentinel.
pub const MAX_SAFE_COUNT: u64 = (1 << 53) - 1;

/// Sentinel returned when a window sum exceeds [`MAX_SAFE_COUNT`].
pub const COUNT_OVERFLOW: i64 = -1;

#[derive(Clone)]
pub struct Counter<C = SystemClock> {
    buckets: Vec<u32>,
    max_duration: usize,
    last_updated_at: i64,
    total: u64,
    clock: C,
}

/// A point-in-time report of a counter's window.
#[derive(Serialize, Deserialize, Debug)]
pub struct Status {
    pub window_secs: u64,
    pub count: i64,
    pub total: u64,
    pub last_updated_at: i64,
}

pub(crate) fn window_buckets(window: Duration) -> Result<usize> {
    if window.is_zero() || window.subsec_nanos() != 0 {
        return Err(Error::InvalidWindow(window));
    }
    usize::try_from(window.as_secs()).map_err(|_| Error::InvalidWindow(window))
}

impl Counter<SystemClock> {
    /// Creates a counter covering `window`, read against the system clock.
    ///
    /// `window` must be a positive whole number of seconds.
    pub fn new(window: Duration) -> Result<Self> {
        Self::with_clock(window, SystemClock)
    }

    /// Creates a counter from a [`Config`].
    pub fn with_config(cfg: Config) -> Result<Self> {
        Self::new(cfg.window)
    }
}

impl Default for Counter<SystemClock> {
    fn default() -> Self {
        Self::from_parts(DEFAULT_WINDOW.as_secs() as usize, SystemClock)
    }
}

impl<C: Clock> Counter<C> {
    /// Creates a counter covering `window`, read against the given clock.
    pub fn with_clock(window: Duration, clock: C) -> Result<Self> {
        let max_duration = window_buckets(window)?;
        Ok(Self::from_parts(max_duration, clock))
    }

    // `max_duration` must already be validated as a positive bucket count.
    pub(crate) fn from_parts(max_duration: usize, clock: C) -> Self {
        let last_updated_at = clock.now_secs();
        Self {
            buckets: vec![0; max_duration],
            max_duration,
            last_updated_at,
            total: 0,
            clock,
        }
    }

    /// Records one event in the current second's bucket.
    ///
    /// Returns `false` if the bucket is saturated at `u32::MAX`; the bucket
    /// is left unchanged, though the observed time still advances.
    pub fn incr(&mut self) -> bool {
        let index = self.advance();
        match self.buckets[index].checked_add(1) {
            Some(n) => {
                self.buckets[index] = n;
                self.total = self.total.saturating_add(1);
                true
            }
            None => {
                warn!("bucket {} overflow, increment rejected", index);
                false
            }
        }
    }

    /// Total events over the whole window.
    ///
    /// Returns [`COUNT_OVERFLOW`] if the sum exceeds [`MAX_SAFE_COUNT`].
    pub fn count(&mut self) -> i64 {
        let index = self.advance();
        to_count(self.window_sum(index, self.max_duration))
    }

    /// Total events over the trailing `window`.
    ///
    /// `window` is truncated to whole seconds, then clamped to one second
    /// at least and the counter's window at most. Returns
    /// [`COUNT_OVERFLOW`] if the sum exceeds [`MAX_SAFE_COUNT`].
    pub fn count_within(&mut self, window: Duration) -> i64 {
        let duration = self.clamp_window(window);
        let index = self.advance();
        to_count(self.window_sum(index, duration))
    }

    /// Events recorded in the current second's bucket.
    pub fn recent(&mut self) -> u32 {
        let index = self.advance();
        self.buckets[index]
    }

    /// Average rate per second over the whole window.
    #[cfg(feature = "rate")]
    #[inline]
    pub fn rate_per_second(&mut self) -> f64 {
        self.rate_per(Duration::from_secs(1))
    }

    /// Average rate per the given duration over the whole window.
    #[cfg(feature = "rate")]
    pub fn rate_per(&mut self, per: Duration) -> f64 {
        let index = self.advance();
        let sum = self.window_sum(index, self.max_duration) as f64;
        sum * (per.as_secs_f64() / self.max_duration as f64)
    }

    /// Reports the counter's current window state.
    pub fn status(&mut self) -> Status {
        let count = self.count();
        Status {
            window_secs: self.max_duration as u64,
            count,
            total: self.total,
            last_updated_at: self.last_updated_at,
        }
    }

    /// The trailing span covered by the buckets.
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.max_duration as u64)
    }

    /// Lifetime number of recorded events.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Reconciles the buffer with the clock and returns the bucket index
    /// for the current second.
    ///
    /// The clock is read once; all zeroing works off that single snapshot,
    /// so a call cannot straddle a second boundary between the reset and
    /// the read or write that follows.
    fn advance(&mut self) -> usize {
        let mut now = self.clock.now_secs();
        if now < self.last_updated_at {
            debug!(
                "clock went backward ({} -> {}), holding window state",
                self.last_updated_at, now
            );
            now = self.last_updated_at;
        }

        let m = self.max_duration;
        let index = now.rem_euclid(m as i64) as usize;
        let elapsed = (now - self.last_updated_at) as u64;

        if elapsed >= m as u64 {
            // every bucket has aged out
            self.buckets.fill(0);
        } else if elapsed > 0 {
            // zero the indices reused since the last access; the range is
            // half-open on the circular index space and may wrap into two
            // contiguous segments
            let start = (self.last_updated_at + 1).rem_euclid(m as i64) as usize;
            let end = (now + 1).rem_euclid(m as i64) as usize;
            if start < end {
                self.buckets[start..end].fill(0);
            } else {
                self.buckets[start..].fill(0);
                self.buckets[..end].fill(0);
            }
        }

        self.last_updated_at = now;
        index
    }

    fn clamp_window(&self, window: Duration) -> usize {
        let secs = window.as_secs();
        if secs < 1 {
            debug!("window {:?} below one second, counting one bucket", window);
            1
        } else if secs > self.max_duration as u64 {
            debug!("window {:?} exceeds the counter window, clamping", window);
            self.max_duration
        } else {
            secs as usize
        }
    }

    // Sums the `duration` most recent buckets ending at `index`, walking
    // backward with wraparound.
    fn window_sum(&self, index: usize, duration: usize) -> u64 {
        let m = self.max_duration;
        let mut sum: u64 = 0;
        for back in 0..duration {
            let idx = (index + m - back) % m;
            sum = sum.saturating_add(u64::from(self.buckets[idx]));
        }
        sum
    }
}

#[inline]
fn to_count(sum: u64) -> i64 {
    if sum > MAX_SAFE_COUNT {
        COUNT_OVERFLOW
    } else {
        sum as i64
    }
}
