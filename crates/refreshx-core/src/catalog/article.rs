use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FocusArea;
use crate::error::ValidationError;

/// A wellness article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// Estimated reading time in minutes.
    pub read_time_min: u32,
    pub main_topic: FocusArea,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub read_by_count: u32,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_favorite: bool,
    pub description: String,
    pub content: String,
}

impl Article {
    /// Create a validated article.
    ///
    /// # Errors
    /// Fails on an empty title or author, or a zero read time.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        read_time_min: u32,
        main_topic: FocusArea,
        added_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let author = author.into();
        if title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if author.trim().is_empty() {
            return Err(ValidationError::Empty { field: "author" });
        }
        if read_time_min == 0 {
            return Err(ValidationError::invalid("read_time_min", "must be positive"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            author,
            read_time_min,
            main_topic,
            added_at,
            read_by_count: 0,
            is_read: false,
            is_favorite: false,
            description: String::new(),
            content: String::new(),
        })
    }

    pub fn with_body(mut self, description: impl Into<String>, content: impl Into<String>) -> Self {
        self.description = description.into();
        self.content = content.into();
        self
    }

    /// Added within the last seven days.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.added_at > now - Duration::days(7)
    }

    /// First paragraph, clipped to 100 characters.
    pub fn preview(&self) -> String {
        let first = self.content.lines().next().unwrap_or_default();
        if first.chars().count() > 100 {
            let clipped: String = first.chars().take(100).collect();
            format!("{clipped}...")
        } else {
            first.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_clips_long_paragraphs() {
        let long = "x".repeat(150);
        let article = Article::new("Eyes", "Dr. A", 4, FocusArea::Eye, Utc::now())
            .unwrap()
            .with_body("", format!("{long}\nsecond"));
        assert_eq!(article.preview().len(), 103);
        assert!(article.preview().ends_with("..."));
    }

    #[test]
    fn recent_means_last_week() {
        let now = Utc::now();
        let article = Article::new("Old", "B", 3, FocusArea::Back, now - Duration::days(8)).unwrap();
        assert!(!article.is_recent(now));
    }

    #[test]
    fn rejects_zero_read_time() {
        let err = Article::new("T", "A", 0, FocusArea::Wrist, Utc::now()).unwrap_err();
        assert_eq!(err.field(), "read_time_min");
    }
}
