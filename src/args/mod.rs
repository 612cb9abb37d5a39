//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::WorkerArgs;
pub use defaults::{DEFAULT_MASTER_HOST, DEFAULT_MASTER_PORT, DEFAULT_STATS_INTERVAL};
pub use types::{PositiveU64, Transport};
