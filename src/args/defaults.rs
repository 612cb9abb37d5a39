use std::time::Duration;

/// Master address used when neither CLI nor config provides one.
pub const DEFAULT_MASTER_HOST: &str = "127.0.0.1";
/// Port the master listens on for workers.
pub const DEFAULT_MASTER_PORT: u16 = 5557;
/// Cadence of the windowed stats report.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(3);
/// CLI spelling of [`DEFAULT_STATS_INTERVAL`].
pub(crate) const DEFAULT_STATS_INTERVAL_ARG: &str = "3s";
