//! Error types for commitsql.

use thiserror::Error;

/// Result type for commitsql operations.
pub type Result<T> = std::result::Result<T, CommitsqlError>;

#[derive(Error, Debug)]
pub enum CommitsqlError {
    #[error("Constraint on column {column} is required but not usable in this plan")]
    UnusableConstraint { column: usize },

    #[error("Invalid plan token: {0}")]
    PlanToken(String),

    #[error("No repository given and no default repository configured")]
    NoDefaultRepository,

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Failed to open {path:?}: {source}")]
    RepoOpen {
        path: String,
        #[source]
        source: Box<CommitsqlError>,
    },

    #[error("Failed to resolve {revision:?}: {source}")]
    Revision {
        revision: String,
        #[source]
        source: git2::Error,
    },

    #[error("Malformed .mailmap at line {line}: {reason}")]
    Mailmap { line: usize, reason: String },

    #[error("Failed to load .mailmap of {revision} in {path:?}: {source}")]
    MailmapLoad {
        path: String,
        revision: String,
        #[source]
        source: Box<CommitsqlError>,
    },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CommitsqlError {
    /// True when the error means a git object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CommitsqlError::Git(e) if e.code() == git2::ErrorCode::NotFound)
    }
}

impl From<CommitsqlError> for rusqlite::Error {
    fn from(err: CommitsqlError) -> Self {
        match err {
            CommitsqlError::Sql(e) => e,
            CommitsqlError::UnusableConstraint { column } => rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
                Some(format!("unusable constraint on column {column}")),
            ),
            other => rusqlite::Error::ModuleError(other.to_string()),
        }
    }
}
