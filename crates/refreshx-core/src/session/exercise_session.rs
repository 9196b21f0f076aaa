use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::FocusArea;
use crate::error::ValidationError;
use crate::events::Event;
use crate::time::{seconds_between, Calendar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ExerciseState {
    Active,
    Paused { since: DateTime<Utc> },
    Completed,
}

/// One run of a catalog exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_title: String,
    pub focus_area: FocusArea,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    /// Accumulated paused time in seconds.
    paused_secs: u64,
    calories_burned: f64,
    state: ExerciseState,
    pub last_updated: DateTime<Utc>,
}

impl ExerciseSession {
    /// Start a new session at `start_time`.
    ///
    /// # Errors
    /// Fails if the title is empty.
    pub fn new(
        user_id: Uuid,
        exercise_id: Uuid,
        exercise_title: impl Into<String>,
        focus_area: FocusArea,
        start_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let exercise_title = exercise_title.into();
        if exercise_title.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "exercise_title",
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            exercise_id,
            exercise_title,
            focus_area,
            start_time,
            end_time: None,
            paused_secs: 0,
            calories_burned: 0.0,
            state: ExerciseState::Active,
            last_updated: start_time,
        })
    }

    /// Build an already-finished session, e.g. one performed during a break.
    ///
    /// # Errors
    /// Fails on an empty title or negative calories.
    #[allow(clippy::too_many_arguments)]
    pub fn finished(
        user_id: Uuid,
        exercise_id: Uuid,
        exercise_title: impl Into<String>,
        focus_area: FocusArea,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        paused_secs: u64,
        calories_burned: f64,
    ) -> Result<Self, ValidationError> {
        if calories_burned.is_nan() || calories_burned < 0.0 {
            return Err(ValidationError::invalid(
                "calories_burned",
                "must be non-negative",
            ));
        }
        let mut session = Self::new(user_id, exercise_id, exercise_title, focus_area, start_time)?;
        session.end_time = Some(end_time);
        session.paused_secs = paused_secs;
        session.calories_burned = calories_burned;
        session.state = ExerciseState::Completed;
        session.last_updated = end_time;
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ExerciseState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, ExerciseState::Paused { .. })
    }

    pub fn is_completed(&self) -> bool {
        self.state == ExerciseState::Completed
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn paused_secs(&self) -> u64 {
        self.paused_secs
    }

    pub fn calories_burned(&self) -> f64 {
        self.calories_burned
    }

    /// Time spent actually exercising: zero until ended, never negative, and
    /// never including paused time.
    pub fn active_duration_secs(&self) -> u64 {
        match self.end_time {
            None => 0,
            Some(end) => seconds_between(self.start_time, end).saturating_sub(self.paused_secs),
        }
    }

    pub fn is_on_day(&self, day: NaiveDate, calendar: &Calendar) -> bool {
        calendar.day_of(self.start_time) == day
    }

    pub fn formatted_duration(&self) -> String {
        crate::catalog::format_secs(self.active_duration_secs())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            ExerciseState::Active if self.end_time.is_none() => {
                self.state = ExerciseState::Paused { since: now };
                self.last_updated = now;
                Some(Event::ExercisePaused {
                    session_id: self.id,
                    at: now,
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            ExerciseState::Paused { since } if self.end_time.is_none() => {
                self.paused_secs = self.paused_secs.saturating_add(seconds_between(since, now));
                self.state = ExerciseState::Active;
                self.last_updated = now;
                Some(Event::ExerciseResumed {
                    session_id: self.id,
                    paused_secs: self.paused_secs,
                    at: now,
                })
            }
            _ => None,
        }
    }

    pub fn complete(&mut self, calories: f64, now: DateTime<Utc>) -> Option<Event> {
        if self.is_completed() || self.end_time.is_some() {
            return None;
        }
        if let ExerciseState::Paused { since } = self.state {
            self.paused_secs = self.paused_secs.saturating_add(seconds_between(since, now));
        }
        self.end_time = Some(now);
        self.state = ExerciseState::Completed;
        self.calories_burned = if calories.is_nan() { 0.0 } else { calories.max(0.0) };
        self.last_updated = now;
        Some(Event::ExerciseCompleted {
            session_id: self.id,
            focus_area: self.focus_area,
            active_duration_secs: self.active_duration_secs(),
            calories_burned: self.calories_burned,
            at: now,
        })
    }
}
