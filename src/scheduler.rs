//! Background cache refresh
//!
//! A self-re-arming one-shot timer rather than a fixed-rate one: each
//! firing re-reads the configured interval, so interval changes (including
//! disabling) take effect on the very next cycle without a restart.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::cache::{AuthorizationCache, CacheConfig};

/// Drives periodic [`AuthorizationCache::eager_refresh`] passes.
///
/// At most one timer task exists per scheduler; re-scheduling supersedes
/// the previous task. The task fires immediately when armed, then keeps
/// re-arming itself with the current interval until the interval is
/// non-positive, at which point it stops until explicitly re-triggered.
pub struct RefreshScheduler {
    cache: Arc<AuthorizationCache>,
    config: Arc<CacheConfig>,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(cache: Arc<AuthorizationCache>, config: Arc<CacheConfig>) -> Self {
        Self {
            cache,
            config,
            current: Mutex::new(None),
        }
    }

    /// Cancels any scheduled trigger and arms a new one firing
    /// immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_background_refresh(&self) {
        let cache = Arc::clone(&self.cache);
        let config = Arc::clone(&self.config);
        let task = tokio::spawn(async move {
            loop {
                cache.eager_refresh().await;
                let Some(interval) = config.refresh_interval() else {
                    tracing::debug!("cache refresh disabled, not re-arming the timer");
                    break;
                };
                tokio::time::sleep(interval).await;
            }
        });

        let mut current = self.current.lock().expect("refresh timer lock poisoned");
        if let Some(previous) = current.replace(task) {
            previous.abort();
        }
    }

    /// Stops the background refresh until the next explicit trigger.
    pub fn cancel(&self) {
        let mut current = self.current.lock().expect("refresh timer lock poisoned");
        if let Some(previous) = current.take() {
            previous.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
