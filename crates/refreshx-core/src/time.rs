//! Date/time helpers shared by every engine component.
//!
//! All day-granularity questions ("is this the same day?", "how many days
//! apart?", "which week?") go through [`Calendar`] so that a single time zone
//! and week convention is applied everywhere. The current instant comes from
//! a [`Clock`], which tests replace with a [`ManualClock`].

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc, Weekday};
use std::sync::{Arc, RwLock};

use crate::error::ValidationError;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Calendar used for every day/week computation.
///
/// Uses a fixed UTC offset rather than a zone database; the host supplies the
/// user's current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: chrono::FixedOffset,
    week_start: Weekday,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// UTC calendar with ISO (Monday-first) weeks.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            week_start: Weekday::Mon,
        }
    }

    /// Calendar at a fixed offset east of UTC.
    ///
    /// # Errors
    /// Returns a validation error if the offset is not strictly within ±24h.
    pub fn with_offset_minutes(offset_minutes: i32) -> Result<Self, ValidationError> {
        let offset = chrono::FixedOffset::east_opt(offset_minutes.saturating_mul(60)).ok_or_else(
            || ValidationError::invalid("utc_offset_minutes", "must be within ±24 hours"),
        )?;
        Ok(Self {
            offset,
            week_start: Weekday::Mon,
        })
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Calendar day that `instant` falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Combine a calendar day with a time of day.
    pub fn at(&self, day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = day.and_time(time);
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&(local - shift))
    }

    /// Midnight at the start of `day`.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        self.at(day, NaiveTime::MIN)
    }

    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) == self.day_of(b)
    }

    /// Whole calendar days from `from` to `to` (negative when `to` is earlier).
    pub fn days_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        (self.day_of(to) - self.day_of(from)).num_days()
    }

    /// First day of the week containing `day`.
    pub fn week_start_of(&self, day: NaiveDate) -> NaiveDate {
        let current = day.weekday().num_days_from_monday();
        let first = self.week_start.num_days_from_monday();
        let back = (7 + current - first) % 7;
        day - Duration::days(i64::from(back))
    }
}

/// Elapsed minutes from one clock time to a later one, zero if `end` is not
/// after `start`.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Whole seconds from `start` to `end`, floored at zero.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}
