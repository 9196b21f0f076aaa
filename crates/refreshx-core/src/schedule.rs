//! Break scheduling within the workday.
//!
//! The workday is split into `breaks + 1` equal intervals and a break is
//! placed at every inner boundary, so no break lands on clock-in or
//! clock-out. Only slots still ahead of `now` are returned.
//!
//! ```text
//! 09:00 ──── 11:00 ──── 13:00 ──── 15:00 ──── 17:00
//! start      break      break      break      end
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::WorkProfile;
use crate::time::Calendar;

/// Stateless break-time calculator.
#[derive(Debug, Clone, Copy)]
pub struct BreakScheduler {
    calendar: Calendar,
}

/// A break slot plus the instant its reminder should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub break_at: DateTime<Utc>,
    pub remind_at: DateTime<Utc>,
}

impl BreakScheduler {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    /// Remaining break times for `reference_day`, in chronological order.
    ///
    /// Empty when the workday is over, when `break_count` is zero, or when
    /// the workday is too short to space the breaks a second apart.
    pub fn compute_schedule(
        &self,
        work_start: NaiveTime,
        work_end: NaiveTime,
        break_count: u32,
        now: DateTime<Utc>,
        reference_day: NaiveDate,
    ) -> Vec<DateTime<Utc>> {
        let start = self.calendar.at(reference_day, work_start);
        let end = self.calendar.at(reference_day, work_end);

        if now >= end || break_count == 0 {
            return Vec::new();
        }
        let now = now.max(start);

        let work_secs = (end - start).num_seconds();
        let interval = work_secs / (i64::from(break_count) + 1);
        if interval <= 0 {
            return Vec::new();
        }

        (1..=i64::from(break_count))
            .map(|i| start + Duration::seconds(i * interval))
            .filter(|t| *t > now && *t < end)
            .collect()
    }

    /// Remaining breaks for the day `now` falls on, using the profile's window.
    pub fn schedule_for(&self, profile: &WorkProfile, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.compute_schedule(
            profile.job_start(),
            profile.job_end(),
            profile.breaks_preferred(),
            now,
            self.calendar.day_of(now),
        )
    }

    pub fn next_break(&self, profile: &WorkProfile, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule_for(profile, now).into_iter().next()
    }
}

/// Pair each break with its reminder instant, `lead_min` minutes earlier.
pub fn reminder_times(schedule: &[DateTime<Utc>], lead_min: u32) -> Vec<Reminder> {
    let lead = Duration::minutes(i64::from(lead_min));
    schedule
        .iter()
        .map(|&break_at| Reminder {
            break_at,
            remind_at: break_at - lead,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 25, h, m, 0).unwrap()
    }

    fn scheduler() -> BreakScheduler {
        BreakScheduler::new(Calendar::utc())
    }

    #[test]
    fn three_breaks_in_eight_hours() {
        let times = scheduler().compute_schedule(hm(9, 0), hm(17, 0), 3, at(9, 0), day());
        assert_eq!(times, vec![at(11, 0), at(13, 0), at(15, 0)]);
    }

    #[test]
    fn before_work_returns_whole_day() {
        let times = scheduler().compute_schedule(hm(9, 0), hm(17, 0), 3, at(6, 30), day());
        assert_eq!(times.len(), 3);
    }

    #[test]
    fn drops_past_slots() {
        let times = scheduler().compute_schedule(hm(9, 0), hm(17, 0), 3, at(12, 0), day());
        assert_eq!(times, vec![at(13, 0), at(15, 0)]);
        // A slot exactly at `now` is no longer ahead.
        let times = scheduler().compute_schedule(hm(9, 0), hm(17, 0), 3, at(13, 0), day());
        assert_eq!(times, vec![at(15, 0)]);
    }

    #[test]
    fn empty_after_work_or_without_breaks() {
        let s = scheduler();
        assert!(s.compute_schedule(hm(9, 0), hm(17, 0), 3, at(17, 0), day()).is_empty());
        assert!(s.compute_schedule(hm(9, 0), hm(17, 0), 3, at(20, 0), day()).is_empty());
        assert!(s.compute_schedule(hm(9, 0), hm(17, 0), 0, at(9, 0), day()).is_empty());
    }

    #[test]
    fn degenerate_interval_yields_nothing() {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(9, 0, 3).unwrap();
        assert!(scheduler().compute_schedule(start, end, 10, at(8, 0), day()).is_empty());
    }

    #[test]
    fn respects_calendar_offset() {
        let cal = Calendar::with_offset_minutes(60).unwrap();
        let s = BreakScheduler::new(cal);
        let times = s.compute_schedule(hm(9, 0), hm(17, 0), 1, at(0, 0), day());
        // 13:00 local is 12:00 UTC
        assert_eq!(times, vec![at(12, 0)]);
    }

    #[test]
    fn next_break_uses_profile() {
        let profile = WorkProfile::new(hm(9, 0), hm(17, 0), 5, 3, 15).unwrap();
        assert_eq!(scheduler().next_break(&profile, at(11, 30)), Some(at(13, 0)));
        assert_eq!(scheduler().next_break(&profile, at(16, 0)), None);
    }

    #[test]
    fn reminders_fire_before_breaks() {
        let reminders = reminder_times(&[at(11, 0)], 5);
        assert_eq!(reminders[0].remind_at, at(10, 55));
        assert_eq!(reminders[0].break_at, at(11, 0));
    }

    proptest! {
        #[test]
        fn breaks_are_inside_window_and_increasing(
            start_min in 0u32..(12 * 60),
            len_min in 1u32..(12 * 60),
            breaks in 0u32..40,
            now_min in 0u32..(24 * 60),
        ) {
            let start = NaiveTime::from_hms_opt(start_min / 60, start_min % 60, 0).unwrap();
            let end_total = start_min + len_min;
            let end = NaiveTime::from_hms_opt(end_total / 60, end_total % 60, 0).unwrap();
            let now = at(0, 0) + Duration::minutes(i64::from(now_min));

            let times = scheduler().compute_schedule(start, end, breaks, now, day());
            let start_at = Calendar::utc().at(day(), start);
            let end_at = Calendar::utc().at(day(), end);

            for t in &times {
                prop_assert!(*t > start_at && *t < end_at);
                prop_assert!(*t > now);
            }
            for pair in times.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            if now >= end_at || breaks == 0 {
                prop_assert!(times.is_empty());
            }
            prop_assert!(times.len() <= breaks as usize);
        }
    }
}
