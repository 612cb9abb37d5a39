use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::events::StatsEvent;
use super::report::Report;
use super::state::RequestStats;

/// Capacity of the queue between task bodies and the collector.
pub const STATS_EVENT_CAPACITY: usize = 100;
/// Capacity of the queue carrying finished reports to the controller.
pub const REPORT_QUEUE_CAPACITY: usize = 10;

/// Spawns the collector: the only owner of the aggregation state.
///
/// Events are folded in as they arrive and a stripped report is pushed every
/// `report_interval`. The task ends once every event sender is dropped or the
/// report receiver goes away.
#[must_use]
pub fn spawn_stats_collector(
    mut events_rx: mpsc::Receiver<StatsEvent>,
    report_tx: mpsc::Sender<Report>,
    report_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stats = RequestStats::new();
        let first_report = Instant::now()
            .checked_add(report_interval)
            .unwrap_or_else(Instant::now);
        let mut report_tick = interval_at(first_report, report_interval);
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    match event {
                        Some(event) => stats.apply(event),
                        None => break,
                    }
                }
                _ = report_tick.tick() => {
                    let report = stats.collect_report();
                    if report_tx.send(report).await.is_err() {
                        tracing::debug!("Report receiver closed; stopping stats collector.");
                        break;
                    }
                }
            }
        }
    })
}
