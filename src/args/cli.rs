use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_MASTER_HOST, DEFAULT_MASTER_PORT, DEFAULT_STATS_INTERVAL_ARG};
use super::parsers::{parse_bool_env, parse_duration_arg, parse_host};
use super::types::Transport;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Distributed load-testing worker in Rust - registers with a master, hatches virtual users at a bounded rate, caps global throughput, and ships compact windowed stats upstream."
)]
pub struct WorkerArgs {
    /// Host or IP address of the master
    #[arg(
        long = "master-host",
        env = "SWARMER_MASTER_HOST",
        default_value = DEFAULT_MASTER_HOST,
        value_parser = parse_host
    )]
    pub master_host: String,

    /// Port the master listens on for workers
    #[arg(
        long = "master-port",
        env = "SWARMER_MASTER_PORT",
        default_value_t = DEFAULT_MASTER_PORT
    )]
    pub master_port: u16,

    /// Max task executions per second across all virtual users (0 disables the cap)
    #[arg(long = "max-rps", env = "SWARMER_MAX_RPS", default_value_t = 0)]
    pub max_rps: u64,

    /// Transport used to reach the master
    #[arg(long = "rpc", alias = "transport", default_value = "tcp", ignore_case = true)]
    pub transport: Transport,

    /// Interval between stats reports (supports ms/s/m/h)
    #[arg(
        long = "stats-interval",
        default_value = DEFAULT_STATS_INTERVAL_ARG,
        value_parser = parse_duration_arg
    )]
    pub stats_interval: Duration,

    /// Override the generated node id reported to the master
    #[arg(long = "node-id", env = "SWARMER_NODE_ID")]
    pub node_id: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by SWARMER_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Path to config file (TOML/JSON). Defaults to ./swarmer.toml or ./swarmer.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}

impl WorkerArgs {
    /// Address of the master as `host:port`.
    #[must_use]
    pub fn master_addr(&self) -> String {
        format!("{}:{}", self.master_host, self.master_port)
    }
}
