//! Error type for the pipeline.

use thiserror::Error;
use uuid::Uuid;

use sfs_tracker_parser::ParserError;

/// Unique key on (document_id, version_number).
pub const VERSION_KEY_CONSTRAINT: &str = "document_versions_document_version_key";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("version {version_number} not found for document {document_id}")]
    VersionNotFound {
        document_id: Uuid,
        version_number: i32,
    },

    #[error("text of version {version_number} of document {document_id} is unavailable")]
    VersionTextUnavailable {
        document_id: Uuid,
        version_number: i32,
    },

    #[error("no version of document {document_id} in force on {date}")]
    NoVersionAtDate {
        document_id: Uuid,
        date: chrono::NaiveDate,
    },

    #[error("amendment not found: {0}")]
    AmendmentNotFound(Uuid),

    #[error("concurrent version conflict: {0}")]
    VersionConflict(String),

    #[error("database operation timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the operation may succeed when retried from the start.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict(_) | Self::Timeout(_))
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        classify(&err).unwrap_or(Self::Database(err))
    }
}

/// Map SQLSTATE codes of concurrency failures onto retryable errors.
fn classify(err: &sqlx::Error) -> Option<PipelineError> {
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return Some(PipelineError::Timeout(err.to_string()));
    }

    let db_err = err.as_database_error()?;
    let message = db_err.message().to_string();
    match db_err.code().as_deref() {
        Some("23505") if db_err.constraint() == Some(VERSION_KEY_CONSTRAINT) => {
            Some(PipelineError::VersionConflict(message))
        }
        // serialization_failure, deadlock_detected, lock_not_available
        Some("40001" | "40P01" | "55P03") => Some(PipelineError::VersionConflict(message)),
        // query_canceled, raised by statement_timeout
        Some("57014") => Some(PipelineError::Timeout(message)),
        _ => None,
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
