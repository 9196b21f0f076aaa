//! SQLite-backed snapshot store.
//!
//! Provides persistent storage for:
//! - User profile, settings, routine and per-user catalog state
//! - Streaks, daily progress and the latest weekly rollup
//! - Break and exercise session history
//! - Key-value store for application state

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{data_dir, migrations, SnapshotStore, UserSnapshot};
use crate::catalog::{Article, Catalog, Exercise, Routine};
use crate::error::{DatabaseError, Result};
use crate::profile::{UserProfile, UserSettings};
use crate::progress::{DailyProgress, WeeklyStats};
use crate::session::{BreakSession, ExerciseSession};
use crate::notification::Notification;
use crate::streak::Streak;

/// Tables holding per-user rows, cleared and rewritten on every save.
const USER_TABLES: [&str; 11] = [
    "users",
    "user_settings",
    "exercises",
    "articles",
    "routines",
    "streaks",
    "daily_progress",
    "weekly_stats",
    "break_sessions",
    "exercise_sessions",
    "notifications",
];

/// SQLite database for user snapshots.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/refreshx.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("refreshx.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn data_rows(&self, sql: &str, user_id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn data_row(&self, sql: &str, user_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let row = self
            .conn
            .query_row(sql, params![user_id.to_string()], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(row)
    }

    fn write_snapshot(tx: &Transaction<'_>, snap: &UserSnapshot) -> Result<()> {
        let user_id = snap.user.id.to_string();
        for table in USER_TABLES {
            let column = if table == "users" { "id" } else { "user_id" };
            tx.execute(&format!("DELETE FROM {table} WHERE {column} = ?1"), params![user_id])?;
        }

        tx.execute(
            "INSERT INTO users (id, name, created_at, data) VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                snap.user.name,
                snap.user.created_at.to_rfc3339(),
                to_json(&snap.user)?
            ],
        )?;
        tx.execute(
            "INSERT INTO user_settings (user_id, data) VALUES (?1, ?2)",
            params![user_id, to_json(&snap.settings)?],
        )?;

        for (position, exercise) in snap.catalog.exercises_iter().enumerate() {
            tx.execute(
                "INSERT INTO exercises (user_id, id, position, data) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, exercise.id.to_string(), position as i64, to_json(exercise)?],
            )?;
        }
        for (position, article) in snap.catalog.articles_iter().enumerate() {
            tx.execute(
                "INSERT INTO articles (user_id, id, position, data) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, article.id.to_string(), position as i64, to_json(article)?],
            )?;
        }

        if let Some(routine) = &snap.routine {
            tx.execute(
                "INSERT INTO routines (user_id, id, data) VALUES (?1, ?2, ?3)",
                params![user_id, routine.id.to_string(), to_json(routine)?],
            )?;
        }
        if let Some(streak) = &snap.streak {
            tx.execute(
                "INSERT INTO streaks (user_id, current_streak, longest_streak, data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, streak.current(), streak.longest(), to_json(streak)?],
            )?;
        }
        for day in &snap.daily_progress {
            tx.execute(
                "INSERT OR REPLACE INTO daily_progress (id, user_id, date, data) VALUES (?1, ?2, ?3, ?4)",
                params![day.id.to_string(), user_id, day.date.to_string(), to_json(day)?],
            )?;
        }
        if let Some(weekly) = &snap.weekly_stats {
            tx.execute(
                "INSERT INTO weekly_stats (user_id, week_start, data) VALUES (?1, ?2, ?3)",
                params![user_id, weekly.week_start.to_string(), to_json(weekly)?],
            )?;
        }
        for session in &snap.break_sessions {
            tx.execute(
                "INSERT OR REPLACE INTO break_sessions (id, user_id, scheduled_time, data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.id.to_string(),
                    user_id,
                    session.scheduled_time.to_rfc3339(),
                    to_json(session)?
                ],
            )?;
        }
        for session in &snap.exercise_sessions {
            tx.execute(
                "INSERT OR REPLACE INTO exercise_sessions (id, user_id, start_time, data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.id.to_string(),
                    user_id,
                    session.start_time().to_rfc3339(),
                    to_json(session)?
                ],
            )?;
        }
        for note in &snap.notifications {
            tx.execute(
                "INSERT OR REPLACE INTO notifications (id, user_id, created_at, is_read, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    note.id.to_string(),
                    user_id,
                    note.created_at.to_rfc3339(),
                    note.is_read,
                    to_json(note)?
                ],
            )?;
        }
        Ok(())
    }
}

impl SnapshotStore for Database {
    /// Rows that fail to decode are dropped with a warning, except the user
    /// and settings rows, which fail the whole load.
    fn load(&self, user_id: Uuid) -> Result<Option<UserSnapshot>> {
        let Some(user_json) = self.data_row("SELECT data FROM users WHERE id = ?1", user_id)? else {
            return Ok(None);
        };
        let user: UserProfile = decode("users", &user_json)?;

        let settings = match self.data_row("SELECT data FROM user_settings WHERE user_id = ?1", user_id)? {
            Some(json) => decode::<UserSettings>("user_settings", &json)?,
            None => UserSettings::new(user.id, user.created_at),
        };

        let exercises: Vec<Exercise> = decode_lenient(
            "exercises",
            self.data_rows("SELECT data FROM exercises WHERE user_id = ?1 ORDER BY position", user_id)?,
        );
        let articles: Vec<Article> = decode_lenient(
            "articles",
            self.data_rows("SELECT data FROM articles WHERE user_id = ?1 ORDER BY position", user_id)?,
        );

        let routine: Option<Routine> = self
            .data_row("SELECT data FROM routines WHERE user_id = ?1", user_id)?
            .and_then(|json| decode_optional("routines", &json));
        let streak: Option<Streak> = self
            .data_row("SELECT data FROM streaks WHERE user_id = ?1", user_id)?
            .and_then(|json| decode_optional("streaks", &json));
        let weekly_stats: Option<WeeklyStats> = self
            .data_row("SELECT data FROM weekly_stats WHERE user_id = ?1", user_id)?
            .and_then(|json| decode_optional("weekly_stats", &json));

        let daily_progress: Vec<DailyProgress> = decode_lenient::<DailyProgress>(
            "daily_progress",
            self.data_rows(
                "SELECT data FROM daily_progress WHERE user_id = ?1 ORDER BY date",
                user_id,
            )?,
        )
        .into_iter()
        .filter(|day| match day.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(date = %day.date, error = %e, "dropping invalid daily progress row");
                false
            }
        })
        .collect();

        let break_sessions: Vec<BreakSession> = decode_lenient(
            "break_sessions",
            self.data_rows(
                "SELECT data FROM break_sessions WHERE user_id = ?1 ORDER BY scheduled_time",
                user_id,
            )?,
        );
        let exercise_sessions: Vec<ExerciseSession> = decode_lenient(
            "exercise_sessions",
            self.data_rows(
                "SELECT data FROM exercise_sessions WHERE user_id = ?1 ORDER BY start_time",
                user_id,
            )?,
        );

        let notifications: Vec<Notification> = decode_lenient(
            "notifications",
            self.data_rows(
                "SELECT data FROM notifications WHERE user_id = ?1 ORDER BY created_at",
                user_id,
            )?,
        );

        Ok(Some(UserSnapshot {
            user,
            settings,
            catalog: Catalog::new(exercises, articles),
            routine,
            streak,
            daily_progress,
            weekly_stats,
            break_sessions,
            exercise_sessions,
            notifications,
        }))
    }

    fn save(&self, snapshot: &UserSnapshot) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        Self::write_snapshot(&tx, snapshot)?;
        tx.commit()?;
        tracing::debug!(user_id = %snapshot.user.id, "snapshot saved");
        Ok(())
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(table: &str, json: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(json).map_err(|e| DatabaseError::CorruptRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}

fn decode_optional<T: DeserializeOwned>(table: &str, json: &str) -> Option<T> {
    match decode(table, json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "dropping unreadable row");
            None
        }
    }
}

fn decode_lenient<T: DeserializeOwned>(table: &str, rows: Vec<String>) -> Vec<T> {
    rows.iter()
        .filter_map(|json| decode_optional(table, json))
        .collect()
}
