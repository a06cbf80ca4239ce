//! Core error types for studypair-core.
//!
//! This module defines the error hierarchy using thiserror. Domain errors
//! (`InvalidGoalRange`, `InvalidStateTransition`) are recoverable and leave
//! state untouched; store errors are surfaced to the caller for retry.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::timer::RunState;

/// Core error type for studypair-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Goal target is not after its start (or spans less than one calendar day).
    #[error("Invalid goal range: target ({target}) must be at least one day after start ({start})")]
    InvalidGoalRange {
        start: DateTime<Utc>,
        target: DateTime<Utc>,
    },

    /// Timer command not allowed from the current run state.
    #[error("Invalid state transition: cannot {action} while {from:?}")]
    InvalidStateTransition {
        action: &'static str,
        from: RunState,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A collaborator store failed; the caller may retry.
    #[error("Store error: {0}")]
    Store(String),

    /// Record lookup failed
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Store(_) | CoreError::Database(DatabaseError::Locked)
        )
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Required text field was blank
    #[error("'{0}' must not be empty")]
    Empty(String),
}

impl ValidationError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_retryable() {
        assert!(CoreError::Store("timeout".into()).is_retryable());
        assert!(CoreError::Database(DatabaseError::Locked).is_retryable());
    }

    #[test]
    fn domain_errors_are_not_retryable() {
        let err = CoreError::InvalidStateTransition {
            action: "pause",
            from: RunState::Idle,
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot pause while Idle"
        );
    }
}
