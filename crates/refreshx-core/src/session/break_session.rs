use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::events::Event;
use crate::time::seconds_between;

/// Shortest break that can be scheduled, in seconds.
pub const MIN_BREAK_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakState {
    Scheduled,
    Active,
    Completed,
    Skipped,
}

impl BreakState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BreakState::Completed | BreakState::Skipped)
    }
}

/// One scheduled break and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    state: BreakState,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    /// Intended duration in seconds.
    duration_secs: u32,
    actual_duration_secs: Option<u64>,
    exercises_completed: Vec<Uuid>,
    pub last_updated: DateTime<Utc>,
}

impl BreakSession {
    /// Schedule a break.
    ///
    /// # Errors
    /// Returns a validation error naming `duration` if it is under a minute.
    pub fn new(
        user_id: Uuid,
        scheduled_time: DateTime<Utc>,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if duration_secs < MIN_BREAK_SECS {
            return Err(ValidationError::invalid(
                "duration",
                format!("must be at least {MIN_BREAK_SECS} seconds"),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            scheduled_time,
            state: BreakState::Scheduled,
            start_time: None,
            end_time: None,
            duration_secs,
            actual_duration_secs: None,
            exercises_completed: Vec::new(),
            last_updated: now,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> BreakState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == BreakState::Active
    }

    pub fn is_completed(&self) -> bool {
        self.state == BreakState::Completed
    }

    pub fn is_skipped(&self) -> bool {
        self.state == BreakState::Skipped
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn actual_duration_secs(&self) -> Option<u64> {
        self.actual_duration_secs
    }

    pub fn exercises_completed(&self) -> &[Uuid] {
        &self.exercises_completed
    }

    /// When the reminder for this break should fire.
    pub fn notification_time(&self, lead_min: u32) -> DateTime<Utc> {
        self.scheduled_time - Duration::minutes(i64::from(lead_min))
    }

    /// Not yet started, skipped, or done, and still in the future.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.state == BreakState::Scheduled && self.scheduled_time > now
    }

    pub fn minutes_until(&self, now: DateTime<Utc>) -> Option<u64> {
        if !self.is_upcoming(now) {
            return None;
        }
        Some(seconds_between(now, self.scheduled_time) / 60)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            BreakState::Scheduled => {
                self.state = BreakState::Active;
                self.start_time = Some(now);
                self.last_updated = now;
                Some(Event::BreakStarted {
                    session_id: self.id,
                    at: now,
                })
            }
            _ => None,
        }
    }

    pub fn end(&mut self, completed_exercise_ids: &[Uuid], now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            BreakState::Active => {
                self.state = BreakState::Completed;
                self.end_time = Some(now);
                self.exercises_completed.extend_from_slice(completed_exercise_ids);
                let actual = self
                    .start_time
                    .map(|start| seconds_between(start, now))
                    .unwrap_or(0);
                self.actual_duration_secs = Some(actual);
                self.last_updated = now;
                Some(Event::BreakCompleted {
                    session_id: self.id,
                    actual_duration_secs: actual,
                    exercises_completed: self.exercises_completed.len(),
                    at: now,
                })
            }
            _ => None,
        }
    }

    pub fn skip(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = BreakState::Skipped;
        self.last_updated = now;
        Some(Event::BreakSkipped {
            session_id: self.id,
            at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 25, 11, 0, 0).unwrap()
    }

    fn session() -> BreakSession {
        BreakSession::new(Uuid::new_v4(), t0(), 300, t0() - Duration::hours(2)).unwrap()
    }

    #[test]
    fn rejects_sub_minute_duration() {
        let err = BreakSession::new(Uuid::new_v4(), t0(), 59, t0()).unwrap_err();
        assert_eq!(err.field(), "duration");
        assert!(BreakSession::new(Uuid::new_v4(), t0(), 60, t0()).is_ok());
    }

    #[test]
    fn full_lifecycle() {
        let mut s = session();
        let ex = Uuid::new_v4();
        assert!(s.start(t0()).is_some());
        assert!(s.is_active());
        let event = s.end(&[ex], t0() + Duration::seconds(290)).unwrap();
        assert!(matches!(
            event,
            Event::BreakCompleted { actual_duration_secs: 290, exercises_completed: 1, .. }
        ));
        assert_eq!(s.state(), BreakState::Completed);
        assert_eq!(s.exercises_completed(), &[ex]);
        assert_eq!(s.actual_duration_secs(), Some(290));
    }

    #[test]
    fn end_requires_active() {
        let mut s = session();
        let before = s.clone();
        assert!(s.end(&[Uuid::new_v4()], t0()).is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn start_is_ignored_once_running_or_terminal() {
        let mut s = session();
        s.start(t0());
        let running = s.clone();
        assert!(s.start(t0() + Duration::minutes(1)).is_none());
        assert_eq!(s, running);

        let mut skipped = session();
        skipped.skip(t0());
        assert!(skipped.start(t0()).is_none());
        assert_eq!(skipped.start_time(), None);
    }

    #[test]
    fn skip_is_terminal_and_exclusive_with_completion() {
        let mut s = session();
        assert!(s.skip(t0()).is_some());
        assert!(s.skip(t0()).is_none());
        assert!(s.end(&[], t0()).is_none());
        assert!(s.is_skipped() && !s.is_completed());

        let mut done = session();
        done.start(t0());
        done.end(&[], t0() + Duration::minutes(5));
        assert!(done.skip(t0() + Duration::minutes(6)).is_none());
        assert!(done.is_completed() && !done.is_skipped());
    }

    #[test]
    fn active_break_can_be_skipped() {
        let mut s = session();
        s.start(t0());
        assert!(s.skip(t0() + Duration::minutes(1)).is_some());
        assert!(s.end(&[], t0() + Duration::minutes(2)).is_none());
        assert_eq!(s.actual_duration_secs(), None);
    }

    #[test]
    fn clock_going_backwards_floors_duration() {
        let mut s = session();
        s.start(t0());
        s.end(&[], t0() - Duration::seconds(30));
        assert_eq!(s.actual_duration_secs(), Some(0));
    }

    #[test]
    fn upcoming_and_reminder() {
        let s = session();
        let now = t0() - Duration::minutes(42);
        assert!(s.is_upcoming(now));
        assert_eq!(s.minutes_until(now), Some(42));
        assert_eq!(s.notification_time(5), t0() - Duration::minutes(5));
        assert_eq!(s.minutes_until(t0() + Duration::minutes(1)), None);
    }
}
