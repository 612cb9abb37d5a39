use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::stats::Reporter;

use super::rate::RateLimiter;

/// Number of running virtual users in the current generation.
///
/// Every hatch or stop starts a fresh [`GenerationUsers`] counter; users of
/// a retired generation keep decrementing their own counter while they wind
/// down and are never counted here again. Used for reporting, never for flow
/// control.
#[derive(Debug, Clone, Default)]
pub struct LiveUsers {
    current: Arc<Mutex<GenerationUsers>>,
}

impl LiveUsers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.current
            .lock()
            .map_or(0, |current| current.count())
    }

    /// Detaches the previous generation and returns the counter of the new one.
    #[must_use]
    pub fn begin_generation(&self) -> GenerationUsers {
        let fresh = GenerationUsers::default();
        self.replace(fresh.clone());
        fresh
    }

    /// Detaches the current generation without starting another; the count
    /// reads zero until the next hatch.
    pub fn detach(&self) {
        self.replace(GenerationUsers::default());
    }

    fn replace(&self, users: GenerationUsers) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = users;
    }
}

/// Live-user counter of a single generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationUsers {
    count: Arc<AtomicU64>,
}

impl GenerationUsers {
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Counts a user in; the returned guard counts it out when dropped.
    #[must_use]
    pub fn enter(&self) -> LiveUserGuard {
        self.count.fetch_add(1, Ordering::Relaxed);
        LiveUserGuard {
            count: Arc::clone(&self.count),
        }
    }
}

#[derive(Debug)]
pub struct LiveUserGuard {
    count: Arc<AtomicU64>,
}

impl Drop for LiveUserGuard {
    fn drop(&mut self) {
        loop {
            let current = self.count.load(Ordering::Relaxed);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if self
                .count
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }
}

/// Everything shared between the controller, spawner and task loops.
///
/// Built once per worker and cloned into each component, so several workers
/// can live in one process without sharing state.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    node_id: Arc<str>,
    reporter: Reporter,
    live_users: LiveUsers,
    rate_limiter: Option<RateLimiter>,
}

impl WorkerContext {
    #[must_use]
    pub fn new(node_id: &str, reporter: Reporter, rate_limiter: Option<RateLimiter>) -> Self {
        Self {
            node_id: Arc::from(node_id),
            reporter,
            live_users: LiveUsers::new(),
            rate_limiter,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    #[must_use]
    pub(crate) fn node_id_shared(&self) -> Arc<str> {
        Arc::clone(&self.node_id)
    }

    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    #[must_use]
    pub const fn live_users(&self) -> &LiveUsers {
        &self.live_users
    }

    #[must_use]
    pub const fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }
}
