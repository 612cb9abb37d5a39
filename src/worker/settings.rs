use std::time::Duration;

use crate::args::{PositiveU64, Transport, WorkerArgs};
use crate::error::{AppError, AppResult, ValidationError};

const NODE_ID_FALLBACK_HOST: &str = "worker";
const NODE_ID_RANDOM_BYTES: usize = 16;

/// Resolved runtime configuration for one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub master_addr: String,
    pub node_id: String,
    pub max_rps: Option<PositiveU64>,
    pub transport: Transport,
    pub stats_interval: Duration,
}

impl WorkerSettings {
    /// Validates parsed arguments and fills in generated values.
    ///
    /// # Errors
    ///
    /// Returns an error when the node id override is blank or the stats
    /// interval is zero.
    pub fn from_args(args: &WorkerArgs) -> AppResult<Self> {
        let node_id = args
            .node_id
            .as_deref()
            .map_or_else(|| Ok(generate_node_id()), parse_node_id)?;
        if args.stats_interval.is_zero() {
            return Err(AppError::validation(ValidationError::DurationZero));
        }
        Ok(Self {
            master_addr: args.master_addr(),
            node_id,
            max_rps: PositiveU64::try_from(args.max_rps).ok(),
            transport: args.transport,
            stats_interval: args.stats_interval,
        })
    }
}

fn parse_node_id(value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(ValidationError::NodeIdEmpty));
    }
    Ok(trimmed.to_owned())
}

/// `{hostname}_{32 hex chars}`; the hostname comes from `HOSTNAME` when set.
#[must_use]
pub fn generate_node_id() -> String {
    let hostname = std::env::var("HOSTNAME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| NODE_ID_FALLBACK_HOST.to_owned());
    let suffix: String = (0..NODE_ID_RANDOM_BYTES)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect();
    format!("{}_{}", hostname, suffix)
}
