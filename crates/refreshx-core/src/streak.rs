//! Consecutive-day activity streaks.
//!
//! One call to [`Streak::record_activity`] per activity event. Day arithmetic
//! goes through the caller's [`Calendar`], so "yesterday" means the same thing
//! here as everywhere else in the engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::time::Calendar;

/// Streak lengths worth celebrating.
pub const MILESTONES: [u32; 8] = [7, 14, 21, 30, 60, 90, 180, 365];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub id: Uuid,
    pub user_id: Uuid,
    current: u32,
    longest: u32,
    last_activity: Option<DateTime<Utc>>,
    /// Append-only; survives resets.
    milestones: Vec<u32>,
    pub last_updated: DateTime<Utc>,
}

/// How a single activity changed the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Started,
    Extended,
    Unchanged,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub change: StreakChange,
    pub current: u32,
    pub milestone: Option<u32>,
}

impl Streak {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            current: 0,
            longest: 0,
            last_activity: None,
            milestones: Vec::new(),
            last_updated: now,
        }
    }

    /// Rebuild a streak from stored values.
    ///
    /// # Errors
    /// Fails when `longest < current`.
    pub fn from_parts(
        user_id: Uuid,
        current: u32,
        longest: u32,
        last_activity: Option<DateTime<Utc>>,
        milestones: Vec<u32>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if longest < current {
            return Err(ValidationError::invalid(
                "longest_streak",
                format!("must be at least the current streak ({current})"),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            current,
            longest,
            last_activity,
            milestones,
            last_updated: now,
        })
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    pub fn milestones(&self) -> &[u32] {
        &self.milestones
    }

    pub fn is_active_on(&self, day: NaiveDate, calendar: &Calendar) -> bool {
        self.last_activity
            .is_some_and(|last| calendar.day_of(last) == day)
    }

    /// Record one activity at `at`.
    ///
    /// Gap of one day extends, same day keeps, anything else (longer gaps and
    /// out-of-order past dates alike) restarts at 1.
    pub fn record_activity(&mut self, at: DateTime<Utc>, calendar: &Calendar) -> StreakUpdate {
        let change = match self.last_activity {
            None => {
                self.current = 1;
                StreakChange::Started
            }
            Some(last) => match calendar.days_between(last, at) {
                1 => {
                    self.current = self.current.saturating_add(1);
                    StreakChange::Extended
                }
                0 => StreakChange::Unchanged,
                _ => {
                    self.current = 1;
                    StreakChange::Reset
                }
            },
        };

        self.longest = self.longest.max(self.current);

        let mut reached = None;
        for milestone in MILESTONES {
            if milestone == self.current && !self.milestones.contains(&milestone) {
                self.milestones.push(milestone);
                reached = Some(milestone);
            }
        }

        self.last_activity = Some(at);
        self.last_updated = at;

        StreakUpdate {
            change,
            current: self.current,
            milestone: reached,
        }
    }
}
