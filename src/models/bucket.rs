//! Time buckets and reporting granularity.
//!
//! A bucket is a contiguous calendar-clock interval identified by its
//! start date. Buckets are generated on demand for a requested granularity
//! and span — never persisted as network state.

use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Reporting bucket width.
///
/// Weekly and bi-weekly buckets step a fixed 7/14 days from their anchor;
/// monthly and quarterly step true calendar months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// 7-day buckets.
    Weekly,
    /// 14-day buckets.
    #[default]
    BiWeekly,
    /// Calendar-month buckets.
    Monthly,
    /// Three-calendar-month buckets.
    Quarterly,
}

impl Granularity {
    /// Parses a configuration string (`weekly`, `bi-weekly`, `monthly`,
    /// `quarterly`), case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "bi-weekly" | "biweekly" | "bi-week" => Some(Self::BiWeekly),
            "monthly" | "month" => Some(Self::Monthly),
            "quarterly" | "quarter" => Some(Self::Quarterly),
            _ => None,
        }
    }

    /// The start of the bucket after one starting at `date`.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => date + Duration::days(7),
            Self::BiWeekly => date + Duration::days(14),
            Self::Monthly => date + Months::new(1),
            Self::Quarterly => date + Months::new(3),
        }
    }
}

/// A contiguous calendar interval `[start, end)`, identified by its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBucket {
    /// First day of the bucket (inclusive).
    pub start: NaiveDate,
    /// First day after the bucket (exclusive).
    pub end: NaiveDate,
}

impl TimeBucket {
    /// Creates a bucket.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether a date falls inside the bucket.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// The bucket start as a midnight instant.
    pub fn start_instant(&self) -> NaiveDateTime {
        self.start.and_hms_opt(0, 0, 0).unwrap_or_default()
    }

    /// The bucket end as a midnight instant (exclusive).
    pub fn end_instant(&self) -> NaiveDateTime {
        self.end.and_hms_opt(0, 0, 0).unwrap_or_default()
    }
}
