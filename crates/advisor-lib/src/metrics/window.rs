//! Metric query time windows

use chrono::{DateTime, Duration, Timelike, Utc};

/// Inclusive query window for a metric pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Use explicit bounds verbatim.
    pub fn from_bounds(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending at the top of the previous hour, reaching back
    /// `days_back` whole days.
    pub fn lookback(days_back: u32) -> Self {
        Self::lookback_from(Utc::now(), days_back)
    }

    /// As [`TimeWindow::lookback`], anchored to an explicit clock reading.
    pub fn lookback_from(now: DateTime<Utc>, days_back: u32) -> Self {
        let floored = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let end = floored - Duration::hours(1);
        let start = end - Duration::hours(i64::from(days_back) * 24);
        Self { start, end }
    }
}
