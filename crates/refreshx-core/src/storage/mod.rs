mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, Routine};
use crate::error::{ConfigError, Result};
use crate::notification::Notification;
use crate::profile::{UserProfile, UserSettings};
use crate::progress::{DailyProgress, WeeklyStats};
use crate::session::{BreakSession, ExerciseSession};
use crate::streak::Streak;

/// Returns the data directory, creating it if needed.
///
/// `REFRESHX_DATA_DIR` wins when set. Otherwise `~/.config/refreshx`, or
/// `~/.config/refreshx-dev` when `REFRESHX_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("REFRESHX_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("REFRESHX_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("refreshx-dev")
            } else {
                base_dir.join("refreshx")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Everything the engine keeps for one signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub user: UserProfile,
    pub settings: UserSettings,
    pub catalog: Catalog,
    pub routine: Option<Routine>,
    pub streak: Option<Streak>,
    /// One record per calendar day, oldest first.
    pub daily_progress: Vec<DailyProgress>,
    pub weekly_stats: Option<WeeklyStats>,
    pub break_sessions: Vec<BreakSession>,
    pub exercise_sessions: Vec<ExerciseSession>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Where user snapshots are persisted between runs.
pub trait SnapshotStore: Send {
    /// `Ok(None)` when nothing has been stored for the user yet.
    fn load(&self, user_id: Uuid) -> Result<Option<UserSnapshot>>;

    fn save(&self, snapshot: &UserSnapshot) -> Result<()>;
}

/// In-process store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: Arc<Mutex<HashMap<Uuid, UserSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, user_id: Uuid) -> Result<Option<UserSnapshot>> {
        let snapshots = match self.snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(snapshots.get(&user_id).cloned())
    }

    fn save(&self, snapshot: &UserSnapshot) -> Result<()> {
        let mut snapshots = match self.snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshots.insert(snapshot.user.id, snapshot.clone());
        Ok(())
    }
}
