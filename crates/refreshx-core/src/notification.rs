//! In-app notification inbox.
//!
//! Notifications are stored per user and shown by the host; delivering them
//! to the OS is up to the host as well.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BreakReminder,
    ExerciseCompleted,
    AllExercisesCompleted,
    DailyGoalAchieved,
    StreakMilestone,
    MissedBreak,
    MissedExercise,
    NewArticleAdded,
    ReminderToRead,
    TipOfTheDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// Entity the notification is about, e.g. an article.
    #[serde(default)]
    pub related_id: Option<Uuid>,
}

impl Notification {
    /// # Errors
    /// Fails if the title or message is empty.
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let message = message.into();
        if title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if message.trim().is_empty() {
            return Err(ValidationError::Empty { field: "message" });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            message,
            is_read: false,
            created_at,
            related_id: None,
        })
    }

    pub fn with_related(mut self, id: Uuid) -> Self {
        self.related_id = Some(id);
        self
    }

    /// Created within the last day.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.created_at > now - Duration::days(1)
    }
}

/// Inbox view, newest first within each half.
#[derive(Debug, Default, Serialize)]
pub struct Inbox<'a> {
    pub pending: Vec<&'a Notification>,
    pub read: Vec<&'a Notification>,
}

impl<'a> Inbox<'a> {
    /// Split `items` into unread and read. Read ones are left out unless
    /// `include_read` is set.
    pub fn split(items: &'a [Notification], include_read: bool) -> Self {
        let mut sorted: Vec<&Notification> = items.iter().filter(|n| include_read || !n.is_read).collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (read, pending) = sorted.into_iter().partition(|n| n.is_read);
        Self { pending, read }
    }

    pub fn unread_count(&self) -> usize {
        self.pending.len()
    }
}
