//! Work calendar model.
//!
//! Converts between calendar-clock instants and working-time units for a
//! given calendar: per-weekday working windows plus dated exceptions
//! (holidays, make-up days). The foundation every date computation in the
//! solver and the apportionment engine depends on.
//!
//! # Time Model
//!
//! Working time is measured in whole minutes. Instants are naive local
//! date-times at minute precision (seconds are truncated). Each working
//! window is a half-open minute range `[start, end)` within a day.
//!
//! # Rounding Rule
//!
//! Instants falling in non-working time round *forward* to the next working
//! instant when used as the start of a measurement. Computed ends always
//! land on a working boundary — the close of a working window counts as a
//! boundary, so a finish at Friday 16:00 and a successor start the following
//! Monday 08:00 are zero working minutes apart.
//!
//! # Consistency
//!
//! `add_working_time`, `subtract_working_time`, and `working_duration` are
//! mutually consistent: `working_duration(t, add_working_time(t, n)) == n`
//! for every instant `t` and every `n >= 0`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CpmError;

/// Minutes in a day; also the exclusive upper bound for window ends.
const DAY_MINUTES: u32 = 24 * 60;

/// A working window within a day: half-open minute range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// Window start (minutes from midnight, inclusive).
    pub start_min: u32,
    /// Window end (minutes from midnight, exclusive).
    pub end_min: u32,
}

impl WorkWindow {
    /// Creates a new window.
    pub fn new(start_min: u32, end_min: u32) -> Self {
        Self { start_min, end_min }
    }

    /// Window length in minutes.
    #[inline]
    pub fn minutes(&self) -> i64 {
        i64::from(self.end_min) - i64::from(self.start_min)
    }

    /// Whether a minute-of-day falls within this window.
    #[inline]
    pub fn contains(&self, minute: u32) -> bool {
        minute >= self.start_min && minute < self.end_min
    }
}

/// Working windows for a single day.
///
/// Empty windows mean the whole day is non-working. Windows are kept
/// sorted and non-overlapping; [`DayPattern::working`] enforces this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPattern {
    windows: Vec<WorkWindow>,
}

impl DayPattern {
    /// A fully non-working day.
    pub fn non_working() -> Self {
        Self::default()
    }

    /// A working day with the given windows.
    ///
    /// Windows must be in ascending order, non-overlapping, with
    /// `start < end <= 1440`.
    pub fn working(windows: Vec<WorkWindow>) -> Result<Self, String> {
        let mut prev_end = 0u32;
        for w in &windows {
            if w.start_min >= w.end_min {
                return Err(format!(
                    "window start {} is not before end {}",
                    w.start_min, w.end_min
                ));
            }
            if w.end_min > DAY_MINUTES {
                return Err(format!("window end {} exceeds {DAY_MINUTES}", w.end_min));
            }
            if w.start_min < prev_end {
                return Err(format!(
                    "window starting at {} overlaps the previous window",
                    w.start_min
                ));
            }
            prev_end = w.end_min;
        }
        Ok(Self { windows })
    }

    /// A single-window working day.
    pub fn single(start_min: u32, end_min: u32) -> Result<Self, String> {
        Self::working(vec![WorkWindow::new(start_min, end_min)])
    }

    /// Total working minutes in this day.
    pub fn minutes(&self) -> i64 {
        self.windows.iter().map(WorkWindow::minutes).sum()
    }

    /// Whether the day has any working time.
    pub fn is_working_day(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Whether a minute-of-day is working.
    fn is_working_at(&self, minute: u32) -> bool {
        self.windows.iter().any(|w| w.contains(minute))
    }

    /// Working minutes within `[from, to)` of this day.
    fn minutes_between(&self, from: u32, to: u32) -> i64 {
        self.windows
            .iter()
            .map(|w| {
                let lo = w.start_min.max(from);
                let hi = w.end_min.min(to);
                if hi > lo {
                    i64::from(hi - lo)
                } else {
                    0
                }
            })
            .sum()
    }

    /// First working minute at or after `minute`, if any remains today.
    fn first_working_at_or_after(&self, minute: u32) -> Option<u32> {
        self.windows
            .iter()
            .find(|w| minute < w.end_min)
            .map(|w| w.start_min.max(minute))
    }
}

/// A work calendar: per-weekday windows plus dated exceptions.
///
/// Immutable after construction and freely shareable across activities;
/// working-time status is a pure function of the definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    /// Calendar identifier.
    pub id: String,
    /// Weekday patterns, Monday through Sunday.
    week: [DayPattern; 7],
    /// Dated overrides. An entry replaces the weekday pattern entirely.
    exceptions: BTreeMap<NaiveDate, DayPattern>,
}

impl Calendar {
    /// Creates a calendar from a week template.
    ///
    /// `week` is Monday through Sunday. Fails with `MalformedInput` if the
    /// template contains no working time at all, since calendar arithmetic
    /// would never terminate on such a calendar.
    pub fn new(id: impl Into<String>, week: [DayPattern; 7]) -> Result<Self, CpmError> {
        let id = id.into();
        if week.iter().all(|d| !d.is_working_day()) {
            return Err(CpmError::malformed(
                &id,
                "calendar week template has no working time",
            ));
        }
        Ok(Self {
            id,
            week,
            exceptions: BTreeMap::new(),
        })
    }

    /// A standard Monday–Friday calendar with one window per working day.
    pub fn five_day(
        id: impl Into<String>,
        start_min: u32,
        end_min: u32,
    ) -> Result<Self, CpmError> {
        let id = id.into();
        let day = DayPattern::single(start_min, end_min)
            .map_err(|detail| CpmError::malformed(&id, detail))?;
        let week = [
            day.clone(),
            day.clone(),
            day.clone(),
            day.clone(),
            day,
            DayPattern::non_working(),
            DayPattern::non_working(),
        ];
        Calendar::new(id, week)
    }

    /// Adds a dated exception.
    ///
    /// Fails with `AmbiguousCalendar` if the date already has an exception —
    /// duplicate exception dates are reported, never silently resolved.
    pub fn with_exception(
        mut self,
        date: NaiveDate,
        pattern: DayPattern,
    ) -> Result<Self, CpmError> {
        if self.exceptions.contains_key(&date) {
            return Err(CpmError::ambiguous_calendar(
                &self.id,
                format!("duplicate exception date {date}"),
            ));
        }
        self.exceptions.insert(date, pattern);
        Ok(self)
    }

    /// The effective pattern for a date (exception, else weekday template).
    pub fn day_pattern(&self, date: NaiveDate) -> &DayPattern {
        self.exceptions
            .get(&date)
            .unwrap_or(&self.week[date.weekday().num_days_from_monday() as usize])
    }

    /// Whether an instant is within working time.
    pub fn is_working(&self, t: NaiveDateTime) -> bool {
        self.day_pattern(t.date()).is_working_at(minute_of_day(t))
    }

    /// The next working instant at or after `t` (round-forward rule).
    ///
    /// Terminates because the week template is guaranteed to contain working
    /// time and exceptions are finite.
    pub fn next_working(&self, t: NaiveDateTime) -> NaiveDateTime {
        let mut date = t.date();
        let mut minute = minute_of_day(t);
        loop {
            if let Some(m) = self.day_pattern(date).first_working_at_or_after(minute) {
                return instant(date, i64::from(m));
            }
            date += Duration::days(1);
            minute = 0;
        }
    }

    /// Adds `minutes` of working time to `t`.
    ///
    /// The start is first rounded forward to a working instant; the result
    /// lands on a working boundary (possibly the close of a window).
    pub fn add_working_time(&self, t: NaiveDateTime, minutes: i64) -> NaiveDateTime {
        debug_assert!(minutes >= 0, "working-time additions are non-negative");
        let start = self.next_working(t);
        let mut date = start.date();
        let mut from = minute_of_day(start);
        let mut remaining = minutes.max(0);
        if remaining == 0 {
            return start;
        }
        loop {
            let pattern = self.day_pattern(date);
            for w in &pattern.windows {
                if w.end_min <= from {
                    continue;
                }
                let begin = w.start_min.max(from);
                let avail = i64::from(w.end_min - begin);
                if remaining <= avail {
                    return instant(date, i64::from(begin) + remaining);
                }
                remaining -= avail;
            }
            date += Duration::days(1);
            from = 0;
        }
    }

    /// Subtracts `minutes` of working time, walking backward from `t`.
    ///
    /// The mirror of [`Calendar::add_working_time`]: the result is the
    /// working boundary `s` such that `working_duration(s, t) == minutes`.
    pub fn subtract_working_time(&self, t: NaiveDateTime, minutes: i64) -> NaiveDateTime {
        debug_assert!(minutes >= 0, "working-time subtractions are non-negative");
        let mut date = t.date();
        let mut upto = minute_of_day(t);
        let mut remaining = minutes.max(0);
        loop {
            let pattern = self.day_pattern(date);
            for w in pattern.windows.iter().rev() {
                if w.start_min >= upto {
                    continue;
                }
                let end = w.end_min.min(upto);
                let avail = i64::from(end - w.start_min);
                if avail > 0 && remaining <= avail {
                    return instant(date, i64::from(end) - remaining);
                }
                remaining -= avail;
            }
            date -= Duration::days(1);
            upto = DAY_MINUTES;
        }
    }

    /// Signed offset: adds when `minutes >= 0`, subtracts otherwise.
    ///
    /// Used for relationship lags, which may be negative (leads).
    pub fn offset_working(&self, t: NaiveDateTime, minutes: i64) -> NaiveDateTime {
        if minutes >= 0 {
            self.add_working_time(t, minutes)
        } else {
            self.subtract_working_time(t, -minutes)
        }
    }

    /// Working minutes in the half-open interval `[start, end)`.
    ///
    /// Returns 0 when `end <= start`; see [`Calendar::signed_working_duration`]
    /// for the signed variant.
    pub fn working_duration(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        if end <= start {
            return 0;
        }
        let (sd, sm) = (start.date(), minute_of_day(start));
        let (ed, em) = (end.date(), minute_of_day(end));
        if sd == ed {
            return self.day_pattern(sd).minutes_between(sm, em);
        }
        let mut total = self.day_pattern(sd).minutes_between(sm, DAY_MINUTES);
        let mut d = sd + Duration::days(1);
        while d < ed {
            total += self.day_pattern(d).minutes();
            d += Duration::days(1);
        }
        total + self.day_pattern(ed).minutes_between(0, em)
    }

    /// Signed working distance from `a` to `b`: positive when `b` is later.
    pub fn signed_working_duration(&self, a: NaiveDateTime, b: NaiveDateTime) -> i64 {
        if b >= a {
            self.working_duration(a, b)
        } else {
            -self.working_duration(b, a)
        }
    }
}

/// Minute-of-day of an instant; seconds truncate.
fn minute_of_day(t: NaiveDateTime) -> u32 {
    let time = t.time();
    time.hour() * 60 + time.minute()
}

/// Builds an instant from a date and a minute count, carrying minute 1440
/// over to the next day's midnight.
fn instant(date: NaiveDate, minute: i64) -> NaiveDateTime {
    let (date, minute) = if minute >= i64::from(DAY_MINUTES) {
        (date + Duration::days(1), minute - i64::from(DAY_MINUTES))
    } else {
        (date, minute)
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(minute as u32 * 60, 0)
        .unwrap_or(NaiveTime::MIN);
    NaiveDateTime::new(date, time)
}
