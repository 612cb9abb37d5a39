use std::collections::BTreeMap;

use serde::Serialize;

/// Serialized form of a [`super::StatsEntry`], field names as the master expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub name: String,
    pub method: String,
    pub last_request_timestamp: i64,
    pub start_time: i64,
    pub num_requests: u64,
    pub num_failures: u64,
    pub total_response_time: u64,
    pub max_response_time: u64,
    pub min_response_time: u64,
    pub total_content_length: u64,
    pub response_times: BTreeMap<u64, u64>,
    pub num_reqs_per_sec: BTreeMap<i64, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub method: String,
    pub name: String,
    pub error: String,
    #[serde(rename = "occurences")]
    pub occurrences: u64,
}

/// A windowed snapshot: every non-empty entry, the total and the error table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub stats: Vec<EntryReport>,
    pub stats_total: EntryReport,
    pub errors: BTreeMap<String, ErrorReport>,
}

impl Report {
    /// True when nothing was recorded during the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
            && self.errors.is_empty()
            && self.stats_total.num_requests == 0
            && self.stats_total.num_failures == 0
    }
}
