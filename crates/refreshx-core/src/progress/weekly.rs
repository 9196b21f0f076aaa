use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DailyProgress;
use crate::error::ValidationError;
use crate::time::Calendar;

/// Rollup of one calendar week of [`DailyProgress`] records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub id: Uuid,
    pub user_id: Uuid,
    /// First day of the week, inclusive.
    pub week_start: NaiveDate,
    /// Last day of the week, inclusive.
    pub week_end: NaiveDate,
    pub total_time_secs: u64,
    pub average_daily_time_secs: u64,
    pub peak_day_time_secs: u64,
    pub peak_day_date: Option<NaiveDate>,
    pub exercises_completed: u32,
    pub exercises_total: u32,
    pub breaks_completed: u32,
    pub breaks_total: u32,
    pub eye_time_secs: u64,
    pub back_time_secs: u64,
    pub wrist_time_secs: u64,
    pub total_calories: f64,
    pub goal_completion_percentage: f64,
    pub growth_percentage_since_last_week: f64,
    pub streak_days: u32,
    pub last_updated: DateTime<Utc>,
}

impl WeeklyStats {
    /// Empty stats for the inclusive range `week_start..=week_end`.
    ///
    /// # Errors
    /// Fails when the range runs backwards.
    pub fn new(
        user_id: Uuid,
        week_start: NaiveDate,
        week_end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if week_end < week_start {
            return Err(ValidationError::InvalidTimeRange {
                field: "week_end",
                start: week_start.to_string(),
                end: week_end.to_string(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            week_start,
            week_end,
            total_time_secs: 0,
            average_daily_time_secs: 0,
            peak_day_time_secs: 0,
            peak_day_date: None,
            exercises_completed: 0,
            exercises_total: 0,
            breaks_completed: 0,
            breaks_total: 0,
            eye_time_secs: 0,
            back_time_secs: 0,
            wrist_time_secs: 0,
            total_calories: 0.0,
            goal_completion_percentage: 0.0,
            growth_percentage_since_last_week: 0.0,
            streak_days: 0,
            last_updated: now,
        })
    }

    /// Roll up the week containing the first record.
    ///
    /// Records outside that week are skipped. The daily average divides by
    /// the number of records passed in, not the number that matched.
    pub fn from_daily_progress(
        records: &[DailyProgress],
        calendar: &Calendar,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let first = records.first()?;
        let week_start = calendar.week_start_of(first.date);
        let week_end = week_start + Duration::days(6);
        let mut stats = Self::new(first.user_id, week_start, week_end, now).ok()?;

        for day in records.iter().filter(|r| (week_start..=week_end).contains(&r.date)) {
            let day_time = day.focus_time_secs();
            stats.total_time_secs += day_time;
            stats.exercises_completed += day.completed_exercises;
            stats.exercises_total += day.total_exercises;
            stats.breaks_completed += day.completed_breaks;
            stats.breaks_total += day.total_breaks;
            stats.eye_time_secs += day.eye.time_secs;
            stats.back_time_secs += day.back.time_secs;
            stats.wrist_time_secs += day.wrist.time_secs;
            stats.total_calories += day.total_calories;

            if stats.peak_day_date.is_none() || day_time > stats.peak_day_time_secs {
                stats.peak_day_time_secs = day_time;
                stats.peak_day_date = Some(day.date);
            }
        }

        stats.average_daily_time_secs = stats.total_time_secs / records.len().max(1) as u64;
        stats.goal_completion_percentage = if stats.exercises_total == 0 {
            0.0
        } else {
            f64::from(stats.exercises_completed) / f64::from(stats.exercises_total) * 100.0
        };
        Some(stats)
    }

    /// Fill in growth relative to the previous week's total time.
    pub fn with_previous_week(mut self, previous: &WeeklyStats) -> Self {
        self.growth_percentage_since_last_week = if previous.total_time_secs == 0 {
            0.0
        } else {
            let prev = previous.total_time_secs as f64;
            (self.total_time_secs as f64 - prev) / prev * 100.0
        };
        self
    }

    pub fn with_streak_days(mut self, days: u32) -> Self {
        self.streak_days = days;
        self
    }

    pub fn contains_date(&self, day: NaiveDate) -> bool {
        (self.week_start..=self.week_end).contains(&day)
    }

    /// Whole weeks from the week containing `today` to this one; negative for
    /// past weeks.
    pub fn week_offset(&self, today: NaiveDate, calendar: &Calendar) -> i64 {
        (self.week_start - calendar.week_start_of(today)).num_days().div_euclid(7)
    }

    pub fn exercise_completion_percentage(&self) -> f64 {
        self.goal_completion_percentage.min(100.0)
    }

    pub fn break_completion_percentage(&self) -> f64 {
        if self.breaks_total == 0 {
            return 0.0;
        }
        (f64::from(self.breaks_completed) / f64::from(self.breaks_total) * 100.0).min(100.0)
    }
}
