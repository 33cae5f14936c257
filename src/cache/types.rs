//! Cache configuration and statistics

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use crate::rules::AccessRuleSet;
use crate::token::AuthenticationToken;

/// Shared, runtime-adjustable cache configuration.
///
/// A single interval drives both the background refresh cadence and the
/// unused-entry TTL, so entries that are no longer queried are pruned
/// roughly once per refresh cycle. A non-positive interval disables the
/// background refresh and age eviction alike; version-based staleness
/// checks still apply on every lookup.
///
/// Interval changes take effect on the next refresh cycle, no restart
/// required.
#[derive(Debug)]
pub struct CacheConfig {
    interval_ms: AtomicI64,
}

impl CacheConfig {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

    /// `None` (or a zero duration) disables the background refresh.
    pub fn new(refresh_interval: Option<Duration>) -> Self {
        let config = Self {
            interval_ms: AtomicI64::new(-1),
        };
        config.set_refresh_interval(refresh_interval);
        config
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        let ms = self.interval_ms.load(Ordering::Relaxed);
        (ms > 0).then(|| Duration::from_millis(ms as u64))
    }

    pub fn set_refresh_interval(&self, refresh_interval: Option<Duration>) {
        let ms = match refresh_interval {
            Some(interval) if !interval.is_zero() => interval.as_millis() as i64,
            _ => -1,
        };
        self.interval_ms.store(ms, Ordering::Relaxed);
    }

    /// How long an untouched entry is kept before eviction; tied to the
    /// refresh interval by design.
    pub fn keep_unused_for(&self) -> Option<Duration> {
        self.refresh_interval()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Some(Self::DEFAULT_REFRESH_INTERVAL))
    }
}

/// Cache statistics for monitoring performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// A settled cache entry. Owned exclusively by the cache; the token is
/// retained so a background refresh can recompute the entry in place.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) token: AuthenticationToken,
    pub(crate) rules: AccessRuleSet,
    pub(crate) version: u64,
    pub(crate) touched: Instant,
}
