//! Error types.
//!
//! Bad input at construction time and failing collaborators (store, config
//! file) are reported through these enums. An illegal session transition is
//! not an error: the transition method returns `None` and changes nothing.

use std::path::PathBuf;
use thiserror::Error;

/// Anything the engine can fail with.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("storage: {0}")]
    Database(#[from] DatabaseError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A mutation or save was attempted with nobody signed in.
    #[error("no user is signed in")]
    NotSignedIn,

    #[error("could not encode record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot store failures.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("sqlite: {0}")]
    Sqlite(String),

    /// Schema upgrade stopped part way; the version row names the last good step.
    #[error("schema upgrade failed: {0}")]
    MigrationFailed(String),

    /// A stored row no longer decodes into its entity.
    #[error("unreadable row in {table}: {message}")]
    CorruptRow { table: String, message: String },

    #[error("database is busy")]
    Locked,
}

/// Config file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("bad value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("no usable data directory: {0}")]
    DataDir(String),
}

/// Rejected input. Every variant carries the name of the field at fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field}: {end} is not after {start}")]
    InvalidTimeRange {
        field: &'static str,
        start: String,
        end: String,
    },

    #[error("{field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("{field} is empty")]
    Empty { field: &'static str },
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidTimeRange { field, .. }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::Empty { field } => field,
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                DatabaseError::Locked
            }
            _ => DatabaseError::Sqlite(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
