use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

const EPOCH: Duration = Duration::from_secs(1);

/// Global cap on task executions per second.
///
/// The budget is a semaphore holding at most `cap` permits. Each execution
/// consumes one permit for good; at every one-second epoch a ticker tops the
/// budget back up to `cap`, which releases every waiter the new budget admits
/// at once.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    cap: usize,
}

impl RateLimiter {
    /// Creates a full budget and starts the epoch ticker.
    ///
    /// Must be called inside a tokio runtime. The ticker stops once every
    /// clone of the limiter is dropped.
    #[must_use]
    pub fn start(max_per_second: u64) -> Self {
        let cap = usize::try_from(max_per_second)
            .unwrap_or(usize::MAX)
            .clamp(1, Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(cap));
        spawn_epoch_ticker(Arc::downgrade(&permits), cap);
        Self { permits, cap }
    }

    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Permits left in the current epoch.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Takes one execution slot, waiting for the next epoch when the budget is
    /// spent. Returns `false` only if the limiter was shut down.
    #[must_use]
    pub async fn acquire(&self) -> bool {
        self.permits
            .acquire()
            .await
            .map(SemaphorePermit::forget)
            .is_ok()
    }
}

fn spawn_epoch_ticker(permits: Weak<Semaphore>, cap: usize) {
    tokio::spawn(async move {
        let first_epoch = Instant::now()
            .checked_add(EPOCH)
            .unwrap_or_else(Instant::now);
        let mut epoch_tick = interval_at(first_epoch, EPOCH);
        epoch_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            epoch_tick.tick().await;
            let Some(permits) = permits.upgrade() else {
                break;
            };
            let available = permits.available_permits();
            if available < cap {
                permits.add_permits(cap.saturating_sub(available));
            }
        }
    });
}
