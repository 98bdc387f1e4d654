// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for questline-core.
//!
//! [`EngineError`] covers infrastructure failures (store unreachable,
//! transaction aborted) and catalog-load problems. Rule violations are not
//! errors; they are [`crate::progression::Rejection`] values returned to the
//! caller as ordinary outcomes.

use std::fmt;

/// Result type using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine errors that abort an operation without partial state.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum EngineError {
    /// Database operation failed.
    Database {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },

    /// A task definition failed validation at catalog load.
    CatalogInvalid {
        /// The offending task id.
        task_id: String,
        /// Why the definition was rejected.
        reason: &'static str,
    },
}

impl EngineError {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database { .. } => "STORE_UNAVAILABLE",
            Self::CatalogInvalid { .. } => "CATALOG_INVALID",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { operation, details } => {
                write!(f, "Store error during '{}': {}", operation, details)
            }
            Self::CatalogInvalid { task_id, reason } => {
                write!(f, "Invalid task definition '{}': {}", task_id, reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Database {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for EngineError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        EngineError::Database {
            operation: "migrate".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::Database {
                operation: "insert".to_string(),
                details: "connection refused".to_string(),
            }
            .error_code(),
            "STORE_UNAVAILABLE"
        );
        assert_eq!(
            EngineError::CatalogInvalid {
                task_id: "x".to_string(),
                reason: "duplicate task id",
            }
            .error_code(),
            "CATALOG_INVALID"
        );
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::Database {
            operation: "insert".to_string(),
            details: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Store error during 'insert': connection refused"
        );

        let err = EngineError::CatalogInvalid {
            task_id: "on1".to_string(),
            reason: "duplicate task id",
        };
        assert_eq!(
            err.to_string(),
            "Invalid task definition 'on1': duplicate task id"
        );
    }
}
