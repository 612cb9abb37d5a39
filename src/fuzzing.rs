use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{WorkerArgs, parsers::parse_duration_arg};
use crate::config::apply_config;
use crate::config::types::ConfigFile;
use crate::error::{AppError, AppResult};
use crate::protocol::{HatchPlan, InboundMessage, decode_inbound};
use crate::worker::WorkerSettings;

thread_local! {
    static BASE_MATCHES: ArgMatches = WorkerArgs::command().get_matches_from(["swarmer"]);
}

/// Decodes an inbound frame body and resolves a hatch into its plan.
///
/// # Errors
///
/// Returns an error when the body is not a valid inbound message.
pub fn decode_inbound_input(body: &[u8]) -> AppResult<(InboundMessage, Option<HatchPlan>)> {
    let message = decode_inbound(body).map_err(AppError::from)?;
    let plan = match message {
        InboundMessage::Hatch(request) => request.plan(),
        InboundMessage::Stop | InboundMessage::Quit => None,
    };
    Ok((message, plan))
}

/// Parses a duration argument (e.g. `3s`, `500ms`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_arg_input(input: &str) -> AppResult<Duration> {
    parse_duration_arg(input).map_err(AppError::from)
}

/// Parses TOML config and resolves it into worker settings.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<WorkerSettings> {
    let config: ConfigFile = toml::from_str(input)?;
    apply_config_to_defaults(&config)
}

/// Parses JSON config and resolves it into worker settings.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<WorkerSettings> {
    let config: ConfigFile = serde_json::from_slice(input)?;
    apply_config_to_defaults(&config)
}

fn apply_config_to_defaults(config: &ConfigFile) -> AppResult<WorkerSettings> {
    BASE_MATCHES.with(|matches| {
        let mut args = WorkerArgs::from_arg_matches(matches)?;
        apply_config(&mut args, matches, config)?;
        WorkerSettings::from_args(&args)
    })
}
