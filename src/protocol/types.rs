use std::collections::BTreeMap;

use serde::Serialize;

use crate::stats::{EntryReport, ErrorReport, Report};

/// Control instructions received from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundMessage {
    Hatch(HatchRequest),
    Stop,
    Quit,
}

impl InboundMessage {
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            InboundMessage::Hatch(_) => "hatch",
            InboundMessage::Stop => "stop",
            InboundMessage::Quit => "quit",
        }
    }
}

/// Raw hatch values as sent by the master; not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchRequest {
    pub num_clients: i64,
    pub hatch_rate: i64,
}

/// A validated hatch: both values are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchPlan {
    pub num_clients: usize,
    pub hatch_rate: usize,
}

impl HatchRequest {
    #[must_use]
    pub const fn new(num_clients: i64, hatch_rate: i64) -> Self {
        Self {
            num_clients,
            hatch_rate,
        }
    }

    /// Returns the spawn plan, or `None` when either value is non-positive.
    #[must_use]
    pub fn plan(self) -> Option<HatchPlan> {
        if self.num_clients <= 0 || self.hatch_rate <= 0 {
            return None;
        }
        let num_clients = usize::try_from(self.num_clients).ok()?;
        let hatch_rate = usize::try_from(self.hatch_rate).ok()?;
        Some(HatchPlan {
            num_clients,
            hatch_rate,
        })
    }
}

/// Messages the worker sends to the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    ClientReady,
    Hatching,
    HatchComplete(HatchCompletePayload),
    ClientStopped,
    Stats(Box<StatsPayload>),
    Quit,
}

impl OutboundMessage {
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            OutboundMessage::ClientReady => "client_ready",
            OutboundMessage::Hatching => "hatching",
            OutboundMessage::HatchComplete(_) => "hatch_complete",
            OutboundMessage::ClientStopped => "client_stopped",
            OutboundMessage::Stats(_) => "stats",
            OutboundMessage::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HatchCompletePayload {
    pub count: u64,
}

/// `stats` message data: a windowed report plus the live user count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPayload {
    pub stats: Vec<EntryReport>,
    pub stats_total: EntryReport,
    pub errors: BTreeMap<String, ErrorReport>,
    pub user_count: u64,
}

impl StatsPayload {
    #[must_use]
    pub fn from_report(report: Report, user_count: u64) -> Self {
        let Report {
            stats,
            stats_total,
            errors,
        } = report;
        Self {
            stats,
            stats_total,
            errors,
            user_count,
        }
    }
}
