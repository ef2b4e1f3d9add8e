//! Named counters sharing one window configuration.
//!
//! A `Registry` keeps one [`Counter`] per event source, created on first
//! use, so callers can track many independent sources (peers, routes,
//! topics) without managing the counters themselves.

use std::time::Duration;

use bytestring::ByteString;
use log::debug;

use crate::clock::{Clock, SystemClock};
use crate::counter::{window_buckets, Counter};
use crate::error::Result;
use crate::Config;

type DashMap<K, V> = dashmap::DashMap<K, V, ahash::RandomState>;

pub struct Registry<C = SystemClock> {
    counters: DashMap<ByteString, Counter<C>>,
    max_duration: usize,
    clock: C,
}

impl Registry<SystemClock> {
    /// Creates a registry whose member counters all cover `window`.
    ///
    /// `window` must be a positive whole number of seconds.
    pub fn new(window: Duration) -> Result<Self> {
        Self::with_clock(window, SystemClock)
    }

    /// Creates a registry from a [`Config`].
    pub fn with_config(cfg: Config) -> Result<Self> {
        Self::new(cfg.window)
    }
}

impl<C: Clock + Clone> Registry<C> {
    /// Creates a registry reading the given clock.
    pub fn with_clock(window: Duration, clock: C) -> Result<Self> {
        let max_duration = window_buckets(window)?;
        Ok(Self {
            counters: DashMap::default(),
            max_duration,
            clock,
        })
    }

    /// Records one event for `name`, creating its counter on first use.
    ///
    /// Returns `false` if the current second's bucket is saturated.
    pub fn incr(&self, name: impl Into<ByteString>) -> bool {
        let name = name.into();
        let mut counter = self.counters.entry(name.clone()).or_insert_with(|| {
            debug!("new counter for {}", name);
            Counter::from_parts(self.max_duration, self.clock.clone())
        });
        counter.incr()
    }

    /// Events over the whole window for `name`; 0 for an unknown name.
    pub fn count(&self, name: &str) -> i64 {
        self.counters
            .get_mut(name)
            .map(|mut c| c.count())
            .unwrap_or(0)
    }

    /// Events over a trailing sub-window for `name`; 0 for an unknown name.
    pub fn count_within(&self, name: &str, window: Duration) -> i64 {
        self.counters
            .get_mut(name)
            .map(|mut c| c.count_within(window))
            .unwrap_or(0)
    }

    /// Lifetime events recorded for `name`.
    pub fn total(&self, name: &str) -> u64 {
        self.counters.get(name).map(|c| c.total()).unwrap_or(0)
    }

    /// Drops the counter for `name`, if present.
    pub fn remove(&self, name: &str) -> bool {
        self.counters.remove(name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The window shared by all member counters.
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.max_duration as u64)
    }

    pub fn names(&self) -> Vec<ByteString> {
        self.counters.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn registry(window_secs: u64, start: i64) -> (Registry<ManualClock>, ManualClock) {
        let clock = ManualClock::new(start);
        let registry =
            Registry::with_clock(Duration::from_secs(window_secs), clock.clone()).unwrap();
        (registry, clock)
    }

    #[test]
    fn rejects_invalid_windows() {
        assert!(Registry::new(Duration::ZERO).is_err());
        assert!(Registry::new(Duration::from_millis(500)).is_err());
        assert!(Registry::new(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn unknown_names_count_zero() {
        let (registry, _clock) = registry(60, 0);
        assert_eq!(registry.count("missing"), 0);
        assert_eq!(registry.count_within("missing", Duration::from_secs(5)), 0);
        assert_eq!(registry.total("missing"), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_isolated() {
        let (registry, _clock) = registry(60, 0);
        assert!(registry.incr("a"));
        assert!(registry.incr("a"));
        assert!(registry.incr("b"));
        assert_eq!(registry.count("a"), 2);
        assert_eq!(registry.count("b"), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn counters_age_with_the_shared_clock() {
        let (registry, clock) = registry(4, 0);
        assert!(registry.incr("a"));
        clock.set(2);
        assert!(registry.incr("a"));
        assert_eq!(registry.count("a"), 2);

        // a full window of silence empties the buckets but not the tally
        clock.set(2 + 4);
        assert_eq!(registry.count("a"), 0);
        assert_eq!(registry.total("a"), 2);
    }

    #[test]
    fn remove_drops_the_counter() {
        let (registry, _clock) = registry(60, 0);
        assert!(registry.incr("gone"));
        assert!(registry.remove("gone"));
        assert!(!registry.remove("gone"));
        assert_eq!(registry.count("gone"), 0);
    }

    #[test]
    fn names_lists_known_counters() {
        let (registry, _clock) = registry(60, 0);
        assert!(registry.incr("x"));
        assert!(registry.incr("y"));
        let mut names = registry
            .names()
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["x", "y"]);
    }
}
