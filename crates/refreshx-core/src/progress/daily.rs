use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, FocusArea, Routine};
use crate::error::ValidationError;
use crate::session::{BreakSession, ExerciseSession};
use crate::time::Calendar;

/// Counters for one focus area within a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaProgress {
    pub completed: u32,
    pub total: u32,
    /// Accumulated active time in seconds.
    pub time_secs: u64,
}

impl AreaProgress {
    pub fn completion_percentage(&self) -> f64 {
        percentage(self.completed, self.total)
    }
}

/// Rollup of one user's activity on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub completed_breaks: u32,
    pub total_breaks: u32,
    /// Minutes of screen time reported by the host.
    #[serde(default)]
    pub screen_time_min: u32,
    pub eye: AreaProgress,
    pub back: AreaProgress,
    pub wrist: AreaProgress,
    #[serde(default)]
    pub back_flexibility_score: f64,
    #[serde(default)]
    pub wrist_strength_score: f64,
    pub total_calories: f64,
    pub last_updated: DateTime<Utc>,
}

impl DailyProgress {
    /// Empty record for `date`. Targets come from the user's routine size and
    /// break preference.
    pub fn new(
        user_id: Uuid,
        date: NaiveDate,
        total_exercises: u32,
        total_breaks: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            completed_exercises: 0,
            total_exercises,
            completed_breaks: 0,
            total_breaks,
            screen_time_min: 0,
            eye: AreaProgress::default(),
            back: AreaProgress::default(),
            wrist: AreaProgress::default(),
            back_flexibility_score: 0.0,
            wrist_strength_score: 0.0,
            total_calories: 0.0,
            last_updated: now,
        }
    }

    /// Take the day's exercise targets from the routine: the overall total and
    /// one per area.
    pub fn set_routine_targets(&mut self, routine: &Routine) {
        self.total_exercises = u32::try_from(routine.len()).unwrap_or(u32::MAX);
        for area in [FocusArea::Eye, FocusArea::Back, FocusArea::Wrist] {
            let total = u32::try_from(routine.exercises_for(area).len()).unwrap_or(u32::MAX);
            if let Some(progress) = self.area_mut(area) {
                progress.total = total;
            }
        }
    }

    /// Check the float fields, which the type system can't keep non-negative.
    ///
    /// # Errors
    /// Names the first negative or NaN field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("back_flexibility_score", self.back_flexibility_score),
            ("wrist_strength_score", self.wrist_strength_score),
            ("total_calories", self.total_calories),
        ];
        for (field, value) in fields {
            if value.is_nan() || value < 0.0 {
                return Err(ValidationError::invalid(field, "must be non-negative"));
            }
        }
        Ok(())
    }

    pub fn area(&self, area: FocusArea) -> Option<&AreaProgress> {
        match area {
            FocusArea::Eye => Some(&self.eye),
            FocusArea::Back => Some(&self.back),
            FocusArea::Wrist => Some(&self.wrist),
            FocusArea::Wellness => None,
        }
    }

    fn area_mut(&mut self, area: FocusArea) -> Option<&mut AreaProgress> {
        match area {
            FocusArea::Eye => Some(&mut self.eye),
            FocusArea::Back => Some(&mut self.back),
            FocusArea::Wrist => Some(&mut self.wrist),
            FocusArea::Wellness => None,
        }
    }

    /// Eye + back + wrist active time.
    pub fn focus_time_secs(&self) -> u64 {
        self.eye.time_secs + self.back.time_secs + self.wrist.time_secs
    }

    pub fn daily_goal_percentage(&self) -> f64 {
        percentage(self.completed_exercises, self.total_exercises)
    }

    pub fn break_completion_percentage(&self) -> f64 {
        percentage(self.completed_breaks, self.total_breaks)
    }

    pub fn area_completion_percentage(&self, area: FocusArea) -> f64 {
        self.area(area)
            .map(AreaProgress::completion_percentage)
            .unwrap_or(0.0)
    }

    /// Count a finished exercise toward this day.
    ///
    /// Ignored unless the session is completed and started on this record's
    /// date. Returns whether anything changed.
    pub fn add_completed_exercise(&mut self, session: &ExerciseSession, calendar: &Calendar) -> bool {
        if !session.is_completed() || !session.is_on_day(self.date, calendar) {
            tracing::debug!(
                session_id = %session.id,
                date = %self.date,
                "exercise session does not belong to this day, ignoring"
            );
            return false;
        }

        self.completed_exercises = self.completed_exercises.saturating_add(1);
        self.total_calories += session.calories_burned();
        let active = session.active_duration_secs();
        if let Some(area) = self.area_mut(session.focus_area) {
            area.completed = area.completed.saturating_add(1);
            area.time_secs = area.time_secs.saturating_add(active);
        }
        self.last_updated = session.last_updated.max(self.last_updated);
        true
    }

    /// Count a finished break toward this day.
    ///
    /// Exercises done during the break are resolved against `catalog` and fed
    /// through [`Self::add_completed_exercise`] as if they had been separate
    /// sessions spanning the break. They are skipped when the user's weight is
    /// unknown, since calories cannot be estimated.
    pub fn add_completed_break(
        &mut self,
        break_session: &BreakSession,
        catalog: &Catalog,
        user_weight_kg: Option<f64>,
        calendar: &Calendar,
    ) -> bool {
        if !break_session.is_completed() || calendar.day_of(break_session.scheduled_time) != self.date {
            tracing::debug!(
                session_id = %break_session.id,
                date = %self.date,
                "break session does not belong to this day, ignoring"
            );
            return false;
        }

        self.completed_breaks = self.completed_breaks.saturating_add(1);
        self.last_updated = break_session.last_updated.max(self.last_updated);

        let (Some(start), Some(end), Some(weight)) =
            (break_session.start_time(), break_session.end_time(), user_weight_kg)
        else {
            return true;
        };

        for exercise_id in break_session.exercises_completed() {
            let Some(exercise) = catalog.exercise(*exercise_id) else {
                tracing::debug!(%exercise_id, "break exercise not in catalog");
                continue;
            };
            let synthesized = ExerciseSession::finished(
                break_session.user_id,
                exercise.id,
                exercise.title.clone(),
                exercise.focus_area,
                start,
                end,
                0,
                exercise.calories_burned(weight),
            );
            match synthesized {
                Ok(session) => {
                    self.add_completed_exercise(&session, calendar);
                }
                Err(e) => tracing::warn!(%exercise_id, error = %e, "could not build break exercise"),
            }
        }
        true
    }
}

/// `completed / total * 100`, capped at 100, zero when there is no target.
fn percentage(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(completed) / f64::from(total) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Exercise;
    use chrono::{Duration, TimeZone};

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 25, h, m, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()
    }

    fn finished(area: FocusArea, start: DateTime<Utc>, secs: i64, kcal: f64) -> ExerciseSession {
        ExerciseSession::finished(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Stretch",
            area,
            start,
            start + Duration::seconds(secs),
            0,
            kcal,
        )
        .unwrap()
    }

    #[test]
    fn exercise_counts_toward_its_area() {
        let cal = Calendar::utc();
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 4, 3, t(8, 0));
        assert!(p.add_completed_exercise(&finished(FocusArea::Back, t(10, 0), 120, 5.5), &cal));
        assert_eq!(p.completed_exercises, 1);
        assert_eq!(p.back.completed, 1);
        assert_eq!(p.back.time_secs, 120);
        assert_eq!(p.total_calories, 5.5);
        assert_eq!(p.daily_goal_percentage(), 25.0);
    }

    #[test]
    fn other_day_session_leaves_counters_unchanged() {
        let cal = Calendar::utc();
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 4, 3, t(8, 0));
        let before = p.clone();
        let yesterday = finished(FocusArea::Eye, t(10, 0) - Duration::days(1), 60, 1.0);
        assert!(!p.add_completed_exercise(&yesterday, &cal));
        assert_eq!(p, before);
    }

    #[test]
    fn unfinished_session_is_ignored() {
        let cal = Calendar::utc();
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 4, 3, t(8, 0));
        let running =
            ExerciseSession::new(Uuid::new_v4(), Uuid::new_v4(), "Blink", FocusArea::Eye, t(9, 0)).unwrap();
        assert!(!p.add_completed_exercise(&running, &cal));
        assert_eq!(p.completed_exercises, 0);
    }

    #[test]
    fn wellness_counts_overall_but_not_per_area() {
        let cal = Calendar::utc();
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 1, 0, t(8, 0));
        p.add_completed_exercise(&finished(FocusArea::Wellness, t(9, 0), 300, 2.0), &cal);
        assert_eq!(p.completed_exercises, 1);
        assert_eq!(p.focus_time_secs(), 0);
    }

    #[test]
    fn break_exercises_roll_into_exercise_totals() {
        let cal = Calendar::utc();
        let user = Uuid::new_v4();
        let eye = Exercise::new("20-20-20 Rule", 60, FocusArea::Eye, 1.0, t(0, 0)).unwrap();
        let wrist = Exercise::new("Wrist Flexor Stretch", 15, FocusArea::Wrist, 1.0, t(0, 0))
            .unwrap()
            .with_reps(1, 2);
        let ids = [eye.id, wrist.id, Uuid::new_v4()];
        let catalog = Catalog::new(vec![eye, wrist], vec![]);

        let mut brk = BreakSession::new(user, t(11, 0), 300, t(8, 0)).unwrap();
        brk.start(t(11, 0));
        brk.end(&ids, t(11, 5));

        let mut p = DailyProgress::new(user, today(), 3, 4, t(8, 0));
        assert!(p.add_completed_break(&brk, &catalog, Some(72.0), &cal));
        assert_eq!(p.completed_breaks, 1);
        // Unknown id is skipped
        assert_eq!(p.completed_exercises, 2);
        assert_eq!(p.eye.time_secs, 300);
        assert_eq!(p.wrist.time_secs, 300);
        // 1.0 * 72 * 60/3600 + 1.0 * 72 * 30/3600
        assert!((p.total_calories - 1.8).abs() < 1e-9);
        assert_eq!(p.break_completion_percentage(), 25.0);
    }

    #[test]
    fn break_without_weight_counts_only_the_break() {
        let cal = Calendar::utc();
        let user = Uuid::new_v4();
        let eye = Exercise::new("Palming", 60, FocusArea::Eye, 1.0, t(0, 0)).unwrap();
        let id = eye.id;
        let catalog = Catalog::new(vec![eye], vec![]);
        let mut brk = BreakSession::new(user, t(11, 0), 300, t(8, 0)).unwrap();
        brk.start(t(11, 0));
        brk.end(&[id], t(11, 5));

        let mut p = DailyProgress::new(user, today(), 3, 4, t(8, 0));
        assert!(p.add_completed_break(&brk, &catalog, None, &cal));
        assert_eq!(p.completed_breaks, 1);
        assert_eq!(p.completed_exercises, 0);
    }

    #[test]
    fn skipped_or_other_day_break_is_ignored() {
        let cal = Calendar::utc();
        let user = Uuid::new_v4();
        let catalog = Catalog::default();
        let mut p = DailyProgress::new(user, today(), 3, 4, t(8, 0));

        let mut skipped = BreakSession::new(user, t(11, 0), 300, t(8, 0)).unwrap();
        skipped.skip(t(11, 0));
        assert!(!p.add_completed_break(&skipped, &catalog, Some(70.0), &cal));

        let mut tomorrow = BreakSession::new(user, t(11, 0) + Duration::days(1), 300, t(8, 0)).unwrap();
        tomorrow.start(t(11, 0) + Duration::days(1));
        tomorrow.end(&[], t(11, 5) + Duration::days(1));
        assert!(!p.add_completed_break(&tomorrow, &catalog, Some(70.0), &cal));
        assert_eq!(p.completed_breaks, 0);
    }

    #[test]
    fn percentages_cap_at_hundred() {
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 1, 0, t(8, 0));
        p.completed_exercises = 3;
        p.eye = AreaProgress { completed: 5, total: 2, time_secs: 0 };
        assert_eq!(p.daily_goal_percentage(), 100.0);
        assert_eq!(p.area_completion_percentage(FocusArea::Eye), 100.0);
        assert_eq!(p.break_completion_percentage(), 0.0);
        assert_eq!(p.area_completion_percentage(FocusArea::Wellness), 0.0);
    }

    #[test]
    fn validate_rejects_negative_calories() {
        let mut p = DailyProgress::new(Uuid::new_v4(), today(), 1, 0, t(8, 0));
        p.total_calories = -1.0;
        assert_eq!(p.validate().unwrap_err().field(), "total_calories");
    }

    #[test]
    fn routine_sets_per_area_targets() {
        let cal = Calendar::utc();
        let mut routine = Routine::new(Uuid::new_v4(), t(8, 0));
        routine.add(Uuid::new_v4(), FocusArea::Eye, t(8, 0));
        routine.add(Uuid::new_v4(), FocusArea::Eye, t(8, 0));
        routine.add(Uuid::new_v4(), FocusArea::Wrist, t(8, 0));

        let mut p = DailyProgress::new(routine.user_id, today(), 0, 3, t(8, 0));
        p.set_routine_targets(&routine);
        assert_eq!(p.total_exercises, 3);
        assert_eq!((p.eye.total, p.back.total, p.wrist.total), (2, 0, 1));

        p.add_completed_exercise(&finished(FocusArea::Eye, t(10, 0), 60, 1.0), &cal);
        assert_eq!(p.area_completion_percentage(FocusArea::Eye), 50.0);
        assert_eq!(p.area_completion_percentage(FocusArea::Back), 0.0);
    }
}
