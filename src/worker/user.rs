use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::stats::Reporter;

type TaskFn = dyn Fn(TaskContext) -> BoxFuture<'static, ()> + Send + Sync;

/// Handed to every task execution.
#[derive(Debug, Clone)]
pub struct TaskContext {
    user_id: usize,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl TaskContext {
    #[must_use]
    pub const fn new(user_id: usize, reporter: Reporter, cancel: CancellationToken) -> Self {
        Self {
            user_id,
            reporter,
            cancel,
        }
    }

    /// Index of the virtual user within its generation.
    #[must_use]
    pub const fn user_id(&self) -> usize {
        self.user_id
    }

    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Cancelled when the user's generation is stopped or superseded.
    ///
    /// Task bodies are never preempted; long-running ones may select on this.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A named unit of work a virtual user executes.
///
/// `weight` is carried for compatibility with weighted task sets; execution
/// order is round-robin and does not consult it.
#[derive(Clone)]
pub struct Task {
    name: String,
    weight: u32,
    func: Arc<TaskFn>,
}

impl Task {
    pub fn new<F, Fut>(name: impl Into<String>, weight: u32, func: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            weight,
            func: Arc::new(move |context| func(context).boxed()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    pub(crate) fn call(&self, context: TaskContext) -> BoxFuture<'static, ()> {
        (self.func)(context)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Think-time bounds between task starts, drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserConfig {
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl UserConfig {
    #[must_use]
    pub const fn between(min_wait: Duration, max_wait: Duration) -> Self {
        Self { min_wait, max_wait }
    }

    #[must_use]
    pub const fn fixed(wait: Duration) -> Self {
        Self::between(wait, wait)
    }
}

/// A simulated client: its wait policy and the tasks it cycles through.
pub trait User: Send + 'static {
    fn config(&self) -> UserConfig;

    fn tasks(&self) -> Vec<Task>;
}

/// Builds one [`User`] per spawned virtual user.
pub trait UserFactory: Send + Sync + 'static {
    fn create(&self, user_id: usize) -> Box<dyn User>;
}

impl<TFn, TUser> UserFactory for TFn
where
    TFn: Fn(usize) -> TUser + Send + Sync + 'static,
    TUser: User,
{
    fn create(&self, user_id: usize) -> Box<dyn User> {
        Box::new(self(user_id))
    }
}
