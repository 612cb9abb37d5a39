//! Request statistics for a worker.
//!
//! Task bodies report outcomes through a [`Reporter`]; a single collector task
//! owns the [`RequestStats`] state, folds every event into it and emits a
//! stripped [`Report`] on a fixed cadence. Reports carry deltas since the
//! previous report, never cumulative totals.

mod clock;
mod collector;
mod entry;
mod events;
mod report;
mod state;


pub use clock::{now_ms, now_secs};
pub use collector::{REPORT_QUEUE_CAPACITY, STATS_EVENT_CAPACITY, spawn_stats_collector};
pub use entry::{StatsEntry, StatsError, TOTAL_ENTRY_NAME, round_response_time};
pub use events::{Outcome, Reporter, ResponseTime, StatsEvent};
pub use report::{EntryReport, ErrorReport, Report};
pub use state::{RequestStats, error_key};
