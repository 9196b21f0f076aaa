//! Exercise and article catalog.
//!
//! The catalog is read-mostly content handed to the engine at sign-in. The
//! engine filters and sorts it for the presentation layer and flips the few
//! per-user flags (routine membership, favorite, read).

mod article;
mod exercise;

pub use article::Article;
pub use exercise::Exercise;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body region or category an exercise/article targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Eye,
    Back,
    Wrist,
    Wellness,
}

impl FocusArea {
    pub const ALL: [FocusArea; 4] = [
        FocusArea::Eye,
        FocusArea::Back,
        FocusArea::Wrist,
        FocusArea::Wellness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::Eye => "Eye",
            FocusArea::Back => "Back",
            FocusArea::Wrist => "Wrist",
            FocusArea::Wellness => "Wellness",
        }
    }
}

impl std::str::FromStr for FocusArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eye" => Ok(FocusArea::Eye),
            "back" => Ok(FocusArea::Back),
            "wrist" => Ok(FocusArea::Wrist),
            "wellness" => Ok(FocusArea::Wellness),
            other => Err(format!("unknown focus area: {other}")),
        }
    }
}

/// Sort keys offered by catalog listings.
///
/// Duration keys only apply to exercises and read-time keys only to
/// articles; a key that doesn't apply keeps catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    NewestFirst,
    OldestFirst,
    LongestDuration,
    ShortestDuration,
    AlphabeticalAz,
    AlphabeticalZa,
    LongestRead,
    ShortestRead,
}

/// Window for time-spent queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrame {
    #[default]
    Today,
    ThisWeek,
}

/// The user's chosen exercises, grouped by area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub eye: Vec<Uuid>,
    #[serde(default)]
    pub back: Vec<Uuid>,
    #[serde(default)]
    pub wrist: Vec<Uuid>,
    pub last_updated: DateTime<Utc>,
}

impl Routine {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            eye: Vec::new(),
            back: Vec::new(),
            wrist: Vec::new(),
            last_updated: now,
        }
    }

    pub fn len(&self) -> usize {
        self.eye.len() + self.back.len() + self.wrist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn exercises_for(&self, area: FocusArea) -> &[Uuid] {
        match area {
            FocusArea::Eye => &self.eye,
            FocusArea::Back => &self.back,
            FocusArea::Wrist => &self.wrist,
            FocusArea::Wellness => &[],
        }
    }

    fn slot_mut(&mut self, area: FocusArea) -> Option<&mut Vec<Uuid>> {
        match area {
            FocusArea::Eye => Some(&mut self.eye),
            FocusArea::Back => Some(&mut self.back),
            FocusArea::Wrist => Some(&mut self.wrist),
            FocusArea::Wellness => None,
        }
    }

    /// Returns false when the area cannot hold routine exercises or the id is
    /// already present.
    pub fn add(&mut self, exercise_id: Uuid, area: FocusArea, now: DateTime<Utc>) -> bool {
        let Some(slot) = self.slot_mut(area) else {
            return false;
        };
        if slot.contains(&exercise_id) {
            return false;
        }
        slot.push(exercise_id);
        self.last_updated = now;
        true
    }

    pub fn remove(&mut self, exercise_id: Uuid, area: FocusArea, now: DateTime<Utc>) {
        if let Some(slot) = self.slot_mut(area) {
            slot.retain(|id| *id != exercise_id);
        }
        self.last_updated = now;
    }

    pub fn contains(&self, exercise_id: Uuid) -> bool {
        self.eye.contains(&exercise_id)
            || self.back.contains(&exercise_id)
            || self.wrist.contains(&exercise_id)
    }

    /// Area holding the most exercises; earlier areas win ties.
    pub fn main_focus_area(&self) -> Option<FocusArea> {
        let counts = [
            (FocusArea::Eye, self.eye.len()),
            (FocusArea::Back, self.back.len()),
            (FocusArea::Wrist, self.wrist.len()),
        ];
        let mut best: Option<(FocusArea, usize)> = None;
        for (area, count) in counts {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((area, count));
            }
        }
        best.map(|(area, _)| area)
    }

    /// Every routine exercise id, eye first, then back, then wrist.
    pub fn exercise_ids(&self) -> impl Iterator<Item = &Uuid> {
        self.eye.iter().chain(self.back.iter()).chain(self.wrist.iter())
    }

    /// Total routine time in whole minutes.
    pub fn total_time_min(&self, catalog: &Catalog) -> u64 {
        let secs: u64 = self
            .exercise_ids()
            .filter_map(|id| catalog.exercise(*id))
            .map(|e| u64::from(e.total_duration_secs()))
            .sum();
        secs / 60
    }

    pub fn total_calories(&self, catalog: &Catalog, weight_kg: Option<f64>) -> f64 {
        let Some(weight) = weight_kg else {
            return 0.0;
        };
        self.exercise_ids()
            .filter_map(|id| catalog.exercise(*id))
            .map(|e| e.calories_burned(weight))
            .sum()
    }
}

/// Exercises and articles keyed by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    exercises: IndexMap<Uuid, Exercise>,
    articles: IndexMap<Uuid, Article>,
}

impl Catalog {
    pub fn new(exercises: Vec<Exercise>, articles: Vec<Article>) -> Self {
        Self {
            exercises: exercises.into_iter().map(|e| (e.id, e)).collect(),
            articles: articles.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn exercise(&self, id: Uuid) -> Option<&Exercise> {
        self.exercises.get(&id)
    }

    pub fn exercise_mut(&mut self, id: Uuid) -> Option<&mut Exercise> {
        self.exercises.get_mut(&id)
    }

    pub fn article(&self, id: Uuid) -> Option<&Article> {
        self.articles.get(&id)
    }

    pub fn article_mut(&mut self, id: Uuid) -> Option<&mut Article> {
        self.articles.get_mut(&id)
    }

    pub fn exercises_iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    pub fn articles_iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty() && self.articles.is_empty()
    }

    /// Exercises, optionally filtered by area, in the requested order.
    pub fn exercises(&self, area: Option<FocusArea>, sort: SortOption) -> Vec<&Exercise> {
        let mut list: Vec<&Exercise> = self
            .exercises
            .values()
            .filter(|e| area.map_or(true, |a| e.focus_area == a))
            .collect();
        match sort {
            SortOption::NewestFirst => list.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
            SortOption::OldestFirst => list.sort_by(|a, b| a.added_at.cmp(&b.added_at)),
            SortOption::LongestDuration => {
                list.sort_by(|a, b| b.total_duration_secs().cmp(&a.total_duration_secs()))
            }
            SortOption::ShortestDuration => {
                list.sort_by(|a, b| a.total_duration_secs().cmp(&b.total_duration_secs()))
            }
            SortOption::AlphabeticalAz => list.sort_by(|a, b| a.title.cmp(&b.title)),
            SortOption::AlphabeticalZa => list.sort_by(|a, b| b.title.cmp(&a.title)),
            SortOption::LongestRead | SortOption::ShortestRead => {}
        }
        list
    }

    /// Articles, optionally filtered by topic and favorites, in the requested order.
    pub fn articles(
        &self,
        area: Option<FocusArea>,
        favorites_only: bool,
        sort: SortOption,
    ) -> Vec<&Article> {
        let mut list: Vec<&Article> = self
            .articles
            .values()
            .filter(|a| area.map_or(true, |t| a.main_topic == t))
            .filter(|a| !favorites_only || a.is_favorite)
            .collect();
        match sort {
            SortOption::NewestFirst => list.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
            SortOption::OldestFirst => list.sort_by(|a, b| a.added_at.cmp(&b.added_at)),
            SortOption::LongestRead => list.sort_by(|a, b| b.read_time_min.cmp(&a.read_time_min)),
            SortOption::ShortestRead => list.sort_by(|a, b| a.read_time_min.cmp(&b.read_time_min)),
            SortOption::AlphabeticalAz => list.sort_by(|a, b| a.title.cmp(&b.title)),
            SortOption::AlphabeticalZa => list.sort_by(|a, b| b.title.cmp(&a.title)),
            SortOption::LongestDuration | SortOption::ShortestDuration => {}
        }
        list
    }
}

/// "N sec" below a minute, "N min" otherwise.
pub(crate) fn format_secs(secs: u64) -> String {
    if secs < 60 {
        format!("{secs} sec")
    } else {
        format!("{} min", secs / 60)
    }
}
