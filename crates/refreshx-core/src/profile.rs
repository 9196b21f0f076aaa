//! User identity, work profile, and settings.
//!
//! These are supplied by the authentication collaborator; the engine only
//! relies on them being valid, which the constructors here enforce.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::time::minutes_between;

pub const MIN_BREAK_DURATION_MIN: u32 = 5;
pub const MAX_BREAK_DURATION_MIN: u32 = 60;
pub const MIN_WEIGHT_KG: f64 = 20.0;
pub const MIN_HEIGHT_CM: f64 = 50.0;

/// Work-hours window and break preferences.
///
/// Fields are private so the `start < end` and range invariants cannot be
/// broken after construction; deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorkProfileFields")]
pub struct WorkProfile {
    job_start: NaiveTime,
    job_end: NaiveTime,
    weekdays: u8,
    breaks_preferred: u32,
    break_duration_min: u32,
}

#[derive(Deserialize)]
struct WorkProfileFields {
    job_start: NaiveTime,
    job_end: NaiveTime,
    weekdays: u8,
    breaks_preferred: u32,
    break_duration_min: u32,
}

impl TryFrom<WorkProfileFields> for WorkProfile {
    type Error = ValidationError;

    fn try_from(f: WorkProfileFields) -> Result<Self, Self::Error> {
        WorkProfile::new(
            f.job_start,
            f.job_end,
            f.weekdays,
            f.breaks_preferred,
            f.break_duration_min,
        )
    }
}

impl Default for WorkProfile {
    fn default() -> Self {
        Self {
            job_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            job_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            weekdays: 5,
            breaks_preferred: 5,
            break_duration_min: 15,
        }
    }
}

impl WorkProfile {
    /// Build a validated profile.
    ///
    /// # Errors
    /// Names the first field that is out of range.
    pub fn new(
        job_start: NaiveTime,
        job_end: NaiveTime,
        weekdays: u8,
        breaks_preferred: u32,
        break_duration_min: u32,
    ) -> Result<Self, ValidationError> {
        if !(1..=7).contains(&weekdays) {
            return Err(ValidationError::invalid("weekdays", "must be between 1 and 7"));
        }
        if !(MIN_BREAK_DURATION_MIN..=MAX_BREAK_DURATION_MIN).contains(&break_duration_min) {
            return Err(ValidationError::invalid(
                "break_duration_min",
                format!("must be between {MIN_BREAK_DURATION_MIN} and {MAX_BREAK_DURATION_MIN}"),
            ));
        }
        if job_start >= job_end {
            return Err(ValidationError::InvalidTimeRange {
                field: "job_end",
                start: job_start.to_string(),
                end: job_end.to_string(),
            });
        }
        Ok(Self {
            job_start,
            job_end,
            weekdays,
            breaks_preferred,
            break_duration_min,
        })
    }

    pub fn job_start(&self) -> NaiveTime {
        self.job_start
    }

    pub fn job_end(&self) -> NaiveTime {
        self.job_end
    }

    pub fn weekdays(&self) -> u8 {
        self.weekdays
    }

    pub fn breaks_preferred(&self) -> u32 {
        self.breaks_preferred
    }

    pub fn break_duration_min(&self) -> u32 {
        self.break_duration_min
    }

    pub fn work_duration_min(&self) -> i64 {
        minutes_between(self.job_start, self.job_end)
    }

    /// 20% of the workday split across the preferred breaks, clamped to
    /// 5..=30 minutes. 15 when no breaks are wanted.
    pub fn recommended_break_duration_min(&self) -> u32 {
        if self.breaks_preferred == 0 {
            return 15;
        }
        let total_break = (self.work_duration_min() as f64 * 0.2) as i64;
        let per_break = total_break / i64::from(self.breaks_preferred);
        per_break.clamp(5, 30) as u32
    }

    pub fn total_break_duration_min(&self) -> u32 {
        self.break_duration_min.saturating_mul(self.breaks_preferred)
    }
}

/// Validated user identity as handed over by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub work: WorkProfile,
    #[serde(default)]
    pub read_article_ids: Vec<Uuid>,
    #[serde(default)]
    pub routine_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// # Errors
    /// Fails if the name is empty.
    pub fn new(
        name: impl Into<String>,
        work: WorkProfile,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            work,
            read_article_ids: Vec::new(),
            routine_id: None,
            created_at,
        })
    }
}

/// Per-user preferences that affect reminders and calorie estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notifications_enabled: bool,
    pub break_reminders_enabled: bool,
    pub exercise_reminders_enabled: bool,
    pub sound_enabled: bool,
    pub auto_start_breaks: bool,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    reminders_before_min: u32,
    pub last_updated: DateTime<Utc>,
}

impl UserSettings {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            notifications_enabled: true,
            break_reminders_enabled: true,
            exercise_reminders_enabled: true,
            sound_enabled: true,
            auto_start_breaks: false,
            weight_kg: None,
            height_cm: None,
            reminders_before_min: 5,
            last_updated: now,
        }
    }

    /// # Errors
    /// Weight below 20 kg or height below 50 cm.
    pub fn with_body(
        mut self,
        weight_kg: Option<f64>,
        height_cm: Option<f64>,
    ) -> Result<Self, ValidationError> {
        if let Some(w) = weight_kg {
            if w.is_nan() || w < MIN_WEIGHT_KG {
                return Err(ValidationError::invalid(
                    "weight_kg",
                    format!("must be at least {MIN_WEIGHT_KG}"),
                ));
            }
        }
        if let Some(h) = height_cm {
            if h.is_nan() || h < MIN_HEIGHT_CM {
                return Err(ValidationError::invalid(
                    "height_cm",
                    format!("must be at least {MIN_HEIGHT_CM}"),
                ));
            }
        }
        self.weight_kg = weight_kg;
        self.height_cm = height_cm;
        Ok(self)
    }

    /// # Errors
    /// Lead time outside 1..=30 minutes.
    pub fn with_reminders_before(mut self, minutes: u32) -> Result<Self, ValidationError> {
        if !(1..=30).contains(&minutes) {
            return Err(ValidationError::invalid(
                "reminders_before_min",
                "must be between 1 and 30",
            ));
        }
        self.reminders_before_min = minutes;
        Ok(self)
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height_cm
    }

    pub fn reminders_before_min(&self) -> u32 {
        self.reminders_before_min
    }

    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        if height_m <= 0.0 {
            return None;
        }
        Some(weight / (height_m * height_m))
    }

    pub fn bmi_category(&self) -> Option<&'static str> {
        let bmi = self.bmi()?;
        Some(if bmi < 18.5 {
            "Underweight"
        } else if bmi < 25.0 {
            "Normal"
        } else if bmi < 30.0 {
            "Overweight"
        } else {
            "Obese"
        })
    }
}
