use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::info;

use crate::args::WorkerArgs;
use crate::config::{apply_config, load_config};
use crate::error::AppResult;
use crate::logger::init_logging;
use crate::shutdown::shutdown_channel;
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::worker::{UserFactory, WorkerExit, WorkerSettings, run_worker};

/// Runs a worker process built from the process arguments.
///
/// Returns after a local shutdown (SIGINT/SIGTERM). A `quit` from the master
/// ends the process immediately with exit code 0.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, and when the
/// connection to the master fails.
pub fn run<TFactory>(factory: TFactory) -> AppResult<()>
where
    TFactory: UserFactory,
{
    run_from(std::env::args_os(), factory)
}

/// Same as [`run`], with explicit arguments (the first one is the binary name).
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, and when the
/// connection to the master fails.
pub fn run_from<I, T, TFactory>(raw_args: I, factory: TFactory) -> AppResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    TFactory: UserFactory,
{
    let (args, matches) = parse_args(raw_args)?;
    let args = resolve_args(args, &matches)?;

    init_logging(args.verbose, args.no_color);
    let settings = WorkerSettings::from_args(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(run_async(settings, factory))? {
        WorkerExit::MasterQuit => std::process::exit(0),
        WorkerExit::LocalShutdown => {
            info!("Shutdown.");
            Ok(())
        }
    }
}

fn parse_args<I, T>(raw_args: I) -> AppResult<(WorkerArgs, ArgMatches)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = WorkerArgs::command().try_get_matches_from(raw_args)?;
    let args = WorkerArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

/// Merges the config file (explicit or default) under the parsed arguments.
fn resolve_args(mut args: WorkerArgs, matches: &ArgMatches) -> AppResult<WorkerArgs> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }
    Ok(args)
}

async fn run_async<TFactory>(settings: WorkerSettings, factory: TFactory) -> AppResult<WorkerExit>
where
    TFactory: UserFactory,
{
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let exit = run_worker(&settings, factory, shutdown_rx).await;
    signal_handle.abort();
    exit
}
