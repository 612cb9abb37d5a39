use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use rand::Rng;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::rate::RateLimiter;
use super::user::{Task, TaskContext, UserConfig};

/// Request type and name reported when a task body panics.
pub(crate) const PANIC_REQUEST_TYPE: &str = "unknown";
pub(crate) const PANIC_REQUEST_NAME: &str = "panic";

/// Draws a think time from `[min_wait, max_wait)`; a degenerate range yields
/// `min_wait` exactly.
pub(crate) fn random_wait_time(config: UserConfig) -> Duration {
    if config.max_wait <= config.min_wait {
        return config.min_wait;
    }
    rand::thread_rng().gen_range(config.min_wait..config.max_wait)
}

/// One virtual user: cycles its tasks until its generation is cancelled.
pub(crate) struct TaskLoop {
    pub context: TaskContext,
    pub config: UserConfig,
    pub tasks: Vec<Task>,
    pub rate_limiter: Option<RateLimiter>,
    pub cancel: CancellationToken,
}

impl TaskLoop {
    pub(crate) async fn run(self) {
        let TaskLoop {
            context,
            config,
            tasks,
            rate_limiter,
            cancel,
        } = self;
        if tasks.is_empty() {
            warn!("User {} has no tasks; exiting.", context.user_id());
            return;
        }

        let mut index = 0_usize;
        while !cancel.is_cancelled() {
            let Some(task) = tasks.get(index) else {
                index = 0;
                continue;
            };

            if let Some(limiter) = rate_limiter.as_ref() {
                let admitted = tokio::select! {
                    () = cancel.cancelled() => false,
                    admitted = limiter.acquire() => admitted,
                };
                if !admitted {
                    break;
                }
            }

            let started = Instant::now();
            run_isolated(task, context.clone()).await;

            let wait = random_wait_time(config).saturating_sub(started.elapsed());
            tokio::select! {
                () = cancel.cancelled() => break,
                () = sleep(wait) => {}
            }

            index = index.saturating_add(1).checked_rem(tasks.len()).unwrap_or(0);
        }
        debug!("User {} stopped.", context.user_id());
    }
}

/// Runs one task body; a panic becomes a synthetic failure instead of
/// unwinding past the user.
pub(crate) async fn run_isolated(task: &Task, context: TaskContext) {
    let reporter = context.reporter().clone();
    let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| task.call(context))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(payload) => Err(payload),
    };
    if let Err(payload) = outcome {
        let message = panic_message(payload.as_ref());
        error!("Task '{}' panicked: {}", task.name(), message);
        reporter
            .failure(PANIC_REQUEST_TYPE, PANIC_REQUEST_NAME, 0_u64, message)
            .await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
