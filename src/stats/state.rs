use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::clock::now_secs;
use super::entry::{StatsEntry, StatsError};
use super::events::StatsEvent;
use super::report::Report;

/// Content hash identifying an error triple in the error table.
#[must_use]
pub fn error_key(method: &str, name: &str, error: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update([0]);
    hasher.update(name.as_bytes());
    hasher.update([0]);
    hasher.update(error.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Aggregation state. Owned by exactly one task; never shared.
#[derive(Debug)]
pub struct RequestStats {
    entries: BTreeMap<(String, String), StatsEntry>,
    errors: BTreeMap<String, StatsError>,
    total: StatsEntry,
    start_time: i64,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStats {
    #[must_use]
    pub fn new() -> Self {
        let now = now_secs();
        Self {
            entries: BTreeMap::new(),
            errors: BTreeMap::new(),
            total: StatsEntry::total(now),
            start_time: now,
        }
    }

    pub fn apply(&mut self, event: StatsEvent) {
        match event {
            StatsEvent::Success {
                request_type,
                name,
                response_time,
                response_length,
            } => self.log_request(&request_type, &name, response_time, response_length),
            StatsEvent::Failure {
                request_type,
                name,
                error,
                ..
            } => self.log_error(&request_type, &name, &error),
            StatsEvent::Clear => self.clear_all(),
        }
    }

    pub fn log_request(
        &mut self,
        method: &str,
        name: &str,
        response_time: u64,
        content_length: u64,
    ) {
        let now = now_secs();
        self.total.log(response_time, content_length, now);
        self.entry_mut(name, method, now)
            .log(response_time, content_length, now);
    }

    /// Counts a failure. Identical (method, name, error) triples share one
    /// error record whose occurrence count grows.
    pub fn log_error(&mut self, method: &str, name: &str, error: &str) {
        let now = now_secs();
        self.total.log_error();
        self.entry_mut(name, method, now).log_error();
        self.errors
            .entry(error_key(method, name, error))
            .or_insert_with(|| {
                StatsError::new(name.to_owned(), method.to_owned(), error.to_owned())
            })
            .occurred();
    }

    pub fn clear_all(&mut self) {
        let now = now_secs();
        self.total = StatsEntry::total(now);
        self.entries.clear();
        self.errors.clear();
        self.start_time = now;
    }

    /// Produces a stripped report: read entries are reset and the error table
    /// is emptied, so consecutive reports never overlap.
    pub fn collect_report(&mut self) -> Report {
        let now = now_secs();
        let stats = self
            .entries
            .values_mut()
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.take_report(now))
            .collect();
        let stats_total = self.total.take_report(now);
        let errors = std::mem::take(&mut self.errors)
            .into_iter()
            .map(|(key, error)| (key, error.to_report()))
            .collect();
        Report {
            stats,
            stats_total,
            errors,
        }
    }

    #[must_use]
    pub fn entry(&self, name: &str, method: &str) -> Option<&StatsEntry> {
        self.entries.get(&(name.to_owned(), method.to_owned()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &StatsEntry> {
        self.entries.values()
    }

    #[must_use]
    pub const fn total(&self) -> &StatsEntry {
        &self.total
    }

    #[must_use]
    pub fn error(&self, method: &str, name: &str, error: &str) -> Option<&StatsError> {
        self.errors.get(&error_key(method, name, error))
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub const fn start_time(&self) -> i64 {
        self.start_time
    }

    fn entry_mut(&mut self, name: &str, method: &str, now: i64) -> &mut StatsEntry {
        self.entries
            .entry((name.to_owned(), method.to_owned()))
            .or_insert_with(|| StatsEntry::new(name.to_owned(), method.to_owned(), now))
    }
}
