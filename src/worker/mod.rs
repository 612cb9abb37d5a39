//! The worker runtime.
//!
//! [`run_worker`] connects to the master and hands inbound instructions to a
//! controller. The controller owns the [`WorkerState`] and one generation of
//! virtual users at a time; a spawner starts users at the requested rate and
//! each user runs its tasks in a loop until the generation is cancelled.
mod context;
mod controller;
mod rate;
mod session;
mod settings;
mod spawner;
mod task_loop;
mod user;


pub use context::{GenerationUsers, LiveUserGuard, LiveUsers, WorkerContext};
pub use controller::WorkerState;
pub use rate::RateLimiter;
pub use session::{WorkerExit, run_worker};
pub use settings::{WorkerSettings, generate_node_id};
pub use user::{Task, TaskContext, User, UserConfig, UserFactory};
