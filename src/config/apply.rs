use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::WorkerArgs;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Values given explicitly on the command line or through an environment
/// variable take precedence over the config file.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut WorkerArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_explicit(matches, "master_host")
        && let Some(host) = config.master_host.as_deref()
    {
        let host = host.trim();
        if host.is_empty() {
            return Err(AppError::config(ConfigError::FieldEmpty {
                field: "master_host",
            }));
        }
        host.clone_into(&mut args.master_host);
    }

    if !is_explicit(matches, "master_port")
        && let Some(port) = config.master_port
    {
        args.master_port = port;
    }

    if !is_explicit(matches, "max_rps")
        && let Some(max_rps) = config.max_rps
    {
        args.max_rps = max_rps;
    }

    if !is_explicit(matches, "transport")
        && let Some(transport) = config.rpc
    {
        args.transport = transport;
    }

    if !is_explicit(matches, "stats_interval")
        && let Some(interval) = config.stats_interval.as_ref()
    {
        args.stats_interval = interval
            .to_duration()
            .map_err(|err| AppError::config(ConfigError::InvalidStatsInterval { source: err }))?;
    }

    if !is_explicit(matches, "node_id")
        && let Some(node_id) = config.node_id.as_deref()
    {
        let node_id = node_id.trim();
        if node_id.is_empty() {
            return Err(AppError::config(ConfigError::FieldEmpty { field: "node_id" }));
        }
        args.node_id = Some(node_id.to_owned());
    }

    if !is_explicit(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_explicit(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}
