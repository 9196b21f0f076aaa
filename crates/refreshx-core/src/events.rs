use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::FocusArea;

/// Every accepted state change produces an Event.
///
/// Transition methods return `Option<Event>`: `None` means the transition was
/// not legal in the current state and nothing was changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BreakStarted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        session_id: Uuid,
        actual_duration_secs: u64,
        exercises_completed: usize,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ExercisePaused {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ExerciseResumed {
        session_id: Uuid,
        paused_secs: u64,
        at: DateTime<Utc>,
    },
    ExerciseCompleted {
        session_id: Uuid,
        focus_area: FocusArea,
        active_duration_secs: u64,
        calories_burned: f64,
        at: DateTime<Utc>,
    },
    StreakMilestone {
        days: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::BreakStarted { at, .. }
            | Event::BreakCompleted { at, .. }
            | Event::BreakSkipped { at, .. }
            | Event::ExercisePaused { at, .. }
            | Event::ExerciseResumed { at, .. }
            | Event::ExerciseCompleted { at, .. }
            | Event::StreakMilestone { at, .. } => *at,
        }
    }
}
