//! The authorization cache proper

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use super::types::{CacheConfig, CacheEntry, CacheStats};
use crate::error::Result;
use crate::resolver::RuleSetSource;
use crate::rules::AccessRuleSet;
use crate::token::AuthenticationToken;

type Settled = Result<AccessRuleSet>;

/// Per-key slot: either a settled entry or an in-flight computation with
/// its queue of waiters.
enum Slot {
    Ready(CacheEntry),
    Pending(Vec<oneshot::Sender<Settled>>),
}

/// Versioned rule-set cache with per-key single-flight resolution.
///
/// Entry life cycle per identity key: absent → fresh → stale → absent.
/// A lookup of a fresh entry touches and returns it; a miss or a stale
/// entry triggers exactly one resolver invocation regardless of how many
/// callers arrive concurrently; later callers wait for the in-flight
/// computation and receive its outcome, success or failure alike. A
/// failed computation is never stored.
///
/// # Thread Safety
///
/// All state lives in a `DashMap` keyed by identity; writes to a slot are
/// mutually exclusive per key and lookups for different keys never block
/// each other.
pub struct AuthorizationCache {
    source: Arc<dyn RuleSetSource>,
    config: Arc<CacheConfig>,
    slots: DashMap<String, Slot>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl AuthorizationCache {
    pub fn new(source: Arc<dyn RuleSetSource>, config: Arc<CacheConfig>) -> Self {
        Self {
            source,
            config,
            slots: DashMap::new(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Returns the rule set for `token`, resolving it on a miss.
    ///
    /// An entry is reused only while its stored version has kept up with
    /// the external policy version and it has been touched within the
    /// unused-entry TTL; otherwise it is recomputed in place.
    ///
    /// # Errors
    ///
    /// Resolution failures propagate to every caller of the failed
    /// computation and leave no entry behind.
    pub async fn get(&self, token: &AuthenticationToken) -> Result<AccessRuleSet> {
        enum Lookup {
            Hit(AccessRuleSet),
            Wait(oneshot::Receiver<Settled>),
            Compute,
        }

        let key = token.cache_key();
        loop {
            let current_version = self.source.policy_version().await?;
            let ttl = self.config.keep_unused_for();

            let lookup = match self.slots.entry(key.clone()) {
                Entry::Occupied(mut occupied) => {
                    let action = match occupied.get_mut() {
                        Slot::Ready(entry)
                            if entry.version >= current_version && !expired(entry, ttl) =>
                        {
                            entry.touched = Instant::now();
                            Lookup::Hit(entry.rules.clone())
                        }
                        // stale or aged out: this caller becomes the
                        // computer
                        Slot::Ready(_) => Lookup::Compute,
                        Slot::Pending(waiters) => {
                            let (sender, receiver) = oneshot::channel();
                            waiters.push(sender);
                            Lookup::Wait(receiver)
                        }
                    };
                    if matches!(&action, Lookup::Compute) {
                        occupied.insert(Slot::Pending(Vec::new()));
                    }
                    action
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(Slot::Pending(Vec::new()));
                    Lookup::Compute
                }
            };

            match lookup {
                Lookup::Hit(rules) => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    return Ok(rules);
                }
                Lookup::Compute => {
                    self.miss_count.fetch_add(1, Ordering::Relaxed);
                    return self.compute(&key, token).await;
                }
                Lookup::Wait(receiver) => match receiver.await {
                    Ok(outcome) => return outcome,
                    // the computation was abandoned; take another turn
                    Err(_) => continue,
                },
            }
        }
    }

    /// Runs the resolver for `key` and settles the pending slot, waking
    /// every waiter with a clone of the outcome.
    async fn compute(&self, key: &str, token: &AuthenticationToken) -> Settled {
        let mut cleanup = PendingCleanup {
            slots: &self.slots,
            key,
            armed: true,
        };

        let outcome = self.source.resolve(token).await;
        let settled: Settled = match &outcome {
            Ok(result) => Ok(result.rules.clone()),
            Err(error) => Err(error.clone()),
        };

        let mut waiters = Vec::new();
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Slot::Pending(pending) = occupied.get_mut() {
                    waiters = std::mem::take(pending);
                }
                match &outcome {
                    Ok(result) => {
                        occupied.insert(Slot::Ready(CacheEntry {
                            token: token.clone(),
                            rules: result.rules.clone(),
                            version: result.version,
                            touched: Instant::now(),
                        }));
                    }
                    // no partial or poisoned entries
                    Err(_) => {
                        occupied.remove();
                    }
                }
            }
            // the slot was cleared while we were computing; hand the
            // result to our caller but let the next lookup miss afresh
            Entry::Vacant(_) => {}
        }
        cleanup.armed = false;

        for waiter in waiters {
            let _ = waiter.send(settled.clone());
        }
        settled
    }

    /// Recomputes every settled entry in place, off the request path.
    ///
    /// Entries untouched for longer than the TTL are evicted instead of
    /// refreshed; a failed recomputation keeps the previous entry. The
    /// touch timestamp is not advanced: a background refresh is not a
    /// use.
    pub async fn eager_refresh(&self) {
        let ttl = self.config.keep_unused_for();
        let mut expired_keys = Vec::new();
        let mut refresh_targets = Vec::new();
        for slot in self.slots.iter() {
            if let Slot::Ready(entry) = slot.value() {
                if expired(entry, ttl) {
                    expired_keys.push(slot.key().clone());
                } else {
                    refresh_targets.push((slot.key().clone(), entry.token.clone()));
                }
            }
        }

        for key in expired_keys {
            self.slots
                .remove_if(&key, |_, slot| matches!(slot, Slot::Ready(entry) if expired(entry, ttl)));
            tracing::debug!(key = %key, "evicted unused cache entry");
        }

        for (key, token) in refresh_targets {
            match self.source.resolve(&token).await {
                Ok(result) => {
                    if let Some(mut slot) = self.slots.get_mut(&key) {
                        if let Slot::Ready(entry) = slot.value_mut() {
                            entry.rules = result.rules;
                            entry.version = result.version;
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        key = %key,
                        error = %error,
                        "background refresh failed, keeping previous entry"
                    );
                }
            }
        }
    }

    /// Unconditionally empties the cache; the next lookup for any
    /// identity is a fresh miss. Waiters of in-flight computations are
    /// woken to recompute.
    pub fn clear(&self) {
        self.slots.clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        let size = self.slots.len();
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            size,
            hit_count: hits,
            miss_count: misses,
            hit_rate,
        }
    }
}

fn expired(entry: &CacheEntry, ttl: Option<Duration>) -> bool {
    ttl.is_some_and(|ttl| entry.touched.elapsed() > ttl)
}

/// Removes the pending slot if the computing future is dropped before it
/// settles, closing every waiter's channel so one of them takes over.
struct PendingCleanup<'a> {
    slots: &'a DashMap<String, Slot>,
    key: &'a str,
    armed: bool,
}

impl Drop for PendingCleanup<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slots
                .remove_if(self.key, |_, slot| matches!(slot, Slot::Pending(_)));
        }
    }
}
