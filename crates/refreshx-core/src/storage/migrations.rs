//! Database schema migrations for refreshx.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: one table per entity.
///
/// Each row carries the columns needed for lookups plus the full entity as
/// JSON in `data`.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            data        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id     TEXT PRIMARY KEY,
            data        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exercises (
            user_id     TEXT NOT NULL,
            id          TEXT NOT NULL,
            position    INTEGER NOT NULL,
            data        TEXT NOT NULL,
            PRIMARY KEY (user_id, id)
        );

        CREATE TABLE IF NOT EXISTS articles (
            user_id     TEXT NOT NULL,
            id          TEXT NOT NULL,
            position    INTEGER NOT NULL,
            data        TEXT NOT NULL,
            PRIMARY KEY (user_id, id)
        );

        CREATE TABLE IF NOT EXISTS routines (
            user_id     TEXT PRIMARY KEY,
            id          TEXT NOT NULL,
            data        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS streaks (
            user_id         TEXT PRIMARY KEY,
            current_streak  INTEGER NOT NULL,
            longest_streak  INTEGER NOT NULL,
            data            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_progress (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            date        TEXT NOT NULL,
            data        TEXT NOT NULL,
            UNIQUE (user_id, date)
        );

        CREATE TABLE IF NOT EXISTS weekly_stats (
            user_id     TEXT PRIMARY KEY,
            week_start  TEXT NOT NULL,
            data        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS break_sessions (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            scheduled_time  TEXT NOT NULL,
            data            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exercise_sessions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            start_time  TEXT NOT NULL,
            data        TEXT NOT NULL
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: key-value table for app state and lookup indexes.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_break_sessions_user_time
            ON break_sessions(user_id, scheduled_time);
        CREATE INDEX IF NOT EXISTS idx_exercise_sessions_user_time
            ON exercise_sessions(user_id, start_time);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: in-app notification inbox.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            is_read     INTEGER NOT NULL DEFAULT 0,
            data        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user_time
            ON notifications(user_id, created_at);",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}
