use clap::Parser;

use crate::error::{AppError, AppResult};

use super::WorkerArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<WorkerArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    WorkerArgs::try_parse_from(args).map_err(AppError::from)
}
