use std::time::Duration;

use tokio::sync::mpsc;

/// Response time in milliseconds.
///
/// Task bodies measure time in whatever unit is convenient; every conversion
/// clamps to a non-negative whole number of milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponseTime(u64);

impl ResponseTime {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResponseTime {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for ResponseTime {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl From<i64> for ResponseTime {
    fn from(value: i64) -> Self {
        Self(u64::try_from(value).unwrap_or(0))
    }
}

impl From<i32> for ResponseTime {
    fn from(value: i32) -> Self {
        Self(u64::try_from(value).unwrap_or(0))
    }
}

impl From<f64> for ResponseTime {
    fn from(value: f64) -> Self {
        // Float to int casts saturate; negatives and NaN become zero.
        Self(value as u64)
    }
}

impl From<Duration> for ResponseTime {
    fn from(value: Duration) -> Self {
        Self(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

/// What a single task execution produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { response_length: u64 },
    Failure { error: String },
}

/// Events consumed by the stats collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsEvent {
    Success {
        request_type: String,
        name: String,
        response_time: u64,
        response_length: u64,
    },
    Failure {
        request_type: String,
        name: String,
        response_time: u64,
        error: String,
    },
    Clear,
}

/// Cloneable handle task bodies use to report outcomes.
///
/// Sends go through a bounded queue, so a slow collector applies backpressure
/// to reporting tasks instead of growing memory.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::Sender<StatsEvent>,
}

impl Reporter {
    #[must_use]
    pub const fn new(tx: mpsc::Sender<StatsEvent>) -> Self {
        Self { tx }
    }

    pub async fn success(
        &self,
        request_type: &str,
        name: &str,
        response_time: impl Into<ResponseTime>,
        response_length: u64,
    ) {
        self.send(StatsEvent::Success {
            request_type: request_type.to_owned(),
            name: name.to_owned(),
            response_time: response_time.into().as_millis(),
            response_length,
        })
        .await;
    }

    pub async fn failure(
        &self,
        request_type: &str,
        name: &str,
        response_time: impl Into<ResponseTime>,
        error: impl Into<String>,
    ) {
        self.send(StatsEvent::Failure {
            request_type: request_type.to_owned(),
            name: name.to_owned(),
            response_time: response_time.into().as_millis(),
            error: error.into(),
        })
        .await;
    }

    pub async fn report(
        &self,
        outcome: Outcome,
        request_type: &str,
        name: &str,
        response_time: impl Into<ResponseTime>,
    ) {
        match outcome {
            Outcome::Success { response_length } => {
                self.success(request_type, name, response_time, response_length)
                    .await;
            }
            Outcome::Failure { error } => {
                self.failure(request_type, name, response_time, error).await;
            }
        }
    }

    /// Resets all aggregation state in the collector.
    pub async fn clear(&self) {
        self.send(StatsEvent::Clear).await;
    }

    async fn send(&self, event: StatsEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("Stats collector stopped; dropping event.");
        }
    }
}
