//! Distributed load-testing worker.
//!
//! A worker registers with a master, spawns virtual users on `hatch`, runs
//! their tasks with randomized think time, optionally caps the global number
//! of task executions per second, and ships windowed request statistics back
//! every few seconds.
//!
//! A binary usually only implements [`User`] and hands a factory to [`run`]:
//!
//! ```no_run
//! use std::time::Duration;
//! use swarmer::{Task, User, UserConfig};
//!
//! struct Browser;
//!
//! impl User for Browser {
//!     fn config(&self) -> UserConfig {
//!         UserConfig::between(Duration::from_secs(1), Duration::from_secs(3))
//!     }
//!
//!     fn tasks(&self) -> Vec<Task> {
//!         vec![Task::new("index", 1, |ctx| async move {
//!             ctx.reporter().success("http", "/", 12, 512).await;
//!         })]
//!     }
//! }
//!
//! fn main() -> swarmer::error::AppResult<()> {
//!     swarmer::run(|_user_id: usize| Browser)
//! }
//! ```
pub mod args;
pub mod config;
pub mod error;
pub mod protocol;
pub mod shutdown;
pub mod stats;
pub mod worker;

mod entry;
mod logger;
mod shutdown_handlers;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

pub use entry::{run, run_from};
pub use stats::{Outcome, Reporter, ResponseTime, now_ms};
pub use worker::{
    Task, TaskContext, User, UserConfig, UserFactory, WorkerExit, WorkerSettings, run_worker,
};
