use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FocusArea;
use crate::error::ValidationError;

/// A catalog exercise the user can perform during a break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: Uuid,
    pub title: String,
    /// Duration of a single repetition, in seconds.
    pub duration_secs: u32,
    pub description: String,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub sets: Option<u32>,
    pub instructions: String,
    pub focus_area: FocusArea,
    #[serde(default)]
    pub other_focus_areas: Vec<String>,
    /// Metabolic equivalent used for calorie estimates.
    pub met_value: f64,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub in_routine: bool,
}

impl Exercise {
    /// Create a validated exercise.
    ///
    /// # Errors
    /// Fails on an empty title, a zero duration, or a negative MET value.
    pub fn new(
        title: impl Into<String>,
        duration_secs: u32,
        focus_area: FocusArea,
        met_value: f64,
        added_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if duration_secs == 0 {
            return Err(ValidationError::invalid("duration_secs", "must be positive"));
        }
        if met_value.is_nan() || met_value < 0.0 {
            return Err(ValidationError::invalid("met_value", "must be non-negative"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            duration_secs,
            description: String::new(),
            reps: None,
            sets: None,
            instructions: String::new(),
            focus_area,
            other_focus_areas: Vec::new(),
            met_value,
            added_at,
            in_routine: false,
        })
    }

    pub fn with_reps(mut self, reps: u32, sets: u32) -> Self {
        self.reps = Some(reps);
        self.sets = Some(sets);
        self
    }

    pub fn with_text(mut self, description: impl Into<String>, instructions: impl Into<String>) -> Self {
        self.description = description.into();
        self.instructions = instructions.into();
        self
    }

    /// Duration across all sets and reps, in seconds.
    pub fn total_duration_secs(&self) -> u32 {
        let repetitions = self.sets.unwrap_or(1).saturating_mul(self.reps.unwrap_or(1));
        self.duration_secs.saturating_mul(repetitions)
    }

    /// Estimated calories for one full run at the given body weight.
    pub fn calories_burned(&self, weight_kg: f64) -> f64 {
        self.met_value * weight_kg * (f64::from(self.total_duration_secs()) / 3600.0)
    }

    /// Instruction text split into individual steps.
    pub fn instruction_steps(&self) -> Vec<&str> {
        self.instructions
            .split(['.', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn formatted_duration(&self) -> String {
        super::format_secs(u64::from(self.total_duration_secs()))
    }
}
