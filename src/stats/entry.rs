use std::collections::BTreeMap;

use super::report::{EntryReport, ErrorReport};

/// Name of the aggregate entry every request is also counted under.
pub const TOTAL_ENTRY_NAME: &str = "Total";

/// Buckets a response time for the histogram, rounding half up.
///
/// Below 100ms the value is kept, below 1s it goes to the nearest 10ms, below
/// 10s to the nearest 100ms and anything slower to the nearest second. This
/// keeps the histogram small enough to ship every few seconds.
#[must_use]
pub const fn round_response_time(response_time: u64) -> u64 {
    if response_time < 100 {
        response_time
    } else if response_time < 1_000 {
        round_to(response_time, 10, 5)
    } else if response_time < 10_000 {
        round_to(response_time, 100, 50)
    } else {
        round_to(response_time, 1_000, 500)
    }
}

const fn round_to(value: u64, step: u64, half: u64) -> u64 {
    match value.saturating_add(half).checked_div(step) {
        Some(quotient) => quotient.saturating_mul(step),
        None => value,
    }
}

/// Counters for one (name, request type) pair, or for the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsEntry {
    name: String,
    method: String,
    num_requests: u64,
    num_failures: u64,
    total_response_time: u64,
    min_response_time: u64,
    max_response_time: u64,
    num_reqs_per_sec: BTreeMap<i64, u64>,
    response_times: BTreeMap<u64, u64>,
    total_content_length: u64,
    start_time: i64,
    last_request_timestamp: i64,
}

impl StatsEntry {
    #[must_use]
    pub const fn new(name: String, method: String, now: i64) -> Self {
        Self {
            name,
            method,
            num_requests: 0,
            num_failures: 0,
            total_response_time: 0,
            min_response_time: 0,
            max_response_time: 0,
            num_reqs_per_sec: BTreeMap::new(),
            response_times: BTreeMap::new(),
            total_content_length: 0,
            start_time: now,
            last_request_timestamp: now,
        }
    }

    #[must_use]
    pub fn total(now: i64) -> Self {
        Self::new(TOTAL_ENTRY_NAME.to_owned(), String::new(), now)
    }

    pub fn reset(&mut self, now: i64) {
        self.num_requests = 0;
        self.num_failures = 0;
        self.total_response_time = 0;
        self.min_response_time = 0;
        self.max_response_time = 0;
        self.num_reqs_per_sec.clear();
        self.response_times.clear();
        self.total_content_length = 0;
        self.start_time = now;
        self.last_request_timestamp = now;
    }

    pub fn log(&mut self, response_time: u64, content_length: u64, now: i64) {
        self.num_requests = self.num_requests.saturating_add(1);
        let per_sec = self.num_reqs_per_sec.entry(now).or_insert(0);
        *per_sec = per_sec.saturating_add(1);
        self.last_request_timestamp = now;

        self.total_response_time = self.total_response_time.saturating_add(response_time);
        if self.num_requests == 1 {
            self.min_response_time = response_time;
        } else {
            self.min_response_time = self.min_response_time.min(response_time);
        }
        self.max_response_time = self.max_response_time.max(response_time);
        let bucket = self
            .response_times
            .entry(round_response_time(response_time))
            .or_insert(0);
        *bucket = bucket.saturating_add(1);

        self.total_content_length = self.total_content_length.saturating_add(content_length);
    }

    pub const fn log_error(&mut self) {
        self.num_failures = self.num_failures.saturating_add(1);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_requests == 0 && self.num_failures == 0
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub const fn num_requests(&self) -> u64 {
        self.num_requests
    }

    #[must_use]
    pub const fn num_failures(&self) -> u64 {
        self.num_failures
    }

    #[must_use]
    pub const fn total_response_time(&self) -> u64 {
        self.total_response_time
    }

    #[must_use]
    pub const fn min_response_time(&self) -> u64 {
        self.min_response_time
    }

    #[must_use]
    pub const fn max_response_time(&self) -> u64 {
        self.max_response_time
    }

    #[must_use]
    pub const fn total_content_length(&self) -> u64 {
        self.total_content_length
    }

    #[must_use]
    pub const fn response_times(&self) -> &BTreeMap<u64, u64> {
        &self.response_times
    }

    #[must_use]
    pub fn to_report(&self) -> EntryReport {
        EntryReport {
            name: self.name.clone(),
            method: self.method.clone(),
            last_request_timestamp: self.last_request_timestamp,
            start_time: self.start_time,
            num_requests: self.num_requests,
            num_failures: self.num_failures,
            total_response_time: self.total_response_time,
            max_response_time: self.max_response_time,
            min_response_time: self.min_response_time,
            total_content_length: self.total_content_length,
            response_times: self.response_times.clone(),
            num_reqs_per_sec: self.num_reqs_per_sec.clone(),
        }
    }

    /// Reads the entry and resets it, so the next read only sees new samples.
    pub fn take_report(&mut self, now: i64) -> EntryReport {
        let report = self.to_report();
        self.reset(now);
        report
    }
}

/// One distinct (request type, name, error) triple and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsError {
    name: String,
    method: String,
    error: String,
    occurrences: u64,
}

impl StatsError {
    #[must_use]
    pub const fn new(name: String, method: String, error: String) -> Self {
        Self {
            name,
            method,
            error,
            occurrences: 0,
        }
    }

    pub const fn occurred(&mut self) {
        self.occurrences = self.occurrences.saturating_add(1);
    }

    #[must_use]
    pub const fn occurrences(&self) -> u64 {
        self.occurrences
    }

    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            method: self.method.clone(),
            name: self.name.clone(),
            error: self.error.clone(),
            occurrences: self.occurrences,
        }
    }
}
