// src/notify/mod.rs
//! Publishing destinations for the weekly report.
//!
//! Error policy: each notifier retries a bounded number of times with
//! doubling backoff, then reports failure as `false`. Nothing here ever
//! propagates an error, and the two destinations are independent.

pub mod notion;
pub mod slack;

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::analyze::Summary;

pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Sleep before retrying `attempt` (0-based): base, 2x, 4x, ...
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// One run's report as handed to the document notifier: the summary plus a
/// page title and generation stamp.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub summary: Summary,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn weekly(summary: Summary, now: DateTime<Utc>) -> Self {
        Self {
            title: format!("Competitor Intelligence - Week of {}", now.format("%Y-%m-%d")),
            summary,
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::zero_update_summary;
    use chrono::TimeZone;

    #[test]
    fn weekly_report_title_carries_the_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap();
        let report = Report::weekly(zero_update_summary(), now);
        assert_eq!(report.title, "Competitor Intelligence - Week of 2024-05-13");
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
    }
}
