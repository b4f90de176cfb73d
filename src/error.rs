//! Error types and handling for Coulomb
//!
//! This module defines the error types used throughout the crate,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Coulomb operations
pub type Result<T> = std::result::Result<T, CoulombError>;

/// Main error type for Coulomb
#[derive(Debug, Error)]
pub enum CoulombError {
    /// A referenced resource does not exist or is not visible to the caller.
    /// Ownership failures use this variant too, so callers cannot probe for
    /// the existence of other users' resources.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The requested state transition collides with existing state
    /// (e.g. the vehicle already has a session in progress)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A request parameter violates its constraints
    #[error("Invalid argument: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    /// Persistence or collaborator failure during an operation
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl CoulombError {
    /// Create a new not-found error for a named resource
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        CoulombError::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        CoulombError::Conflict {
            message: message.into(),
        }
    }

    /// Create a new invalid-argument error
    pub fn invalid_argument<S: Into<String>>(field: S, message: S) -> Self {
        CoulombError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        CoulombError::Internal {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        CoulombError::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        CoulombError::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CoulombError {
    fn from(err: std::io::Error) -> Self {
        CoulombError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoulombError {
    fn from(err: serde_yaml::Error) -> Self {
        CoulombError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoulombError {
    fn from(err: serde_json::Error) -> Self {
        CoulombError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for CoulombError {
    fn from(err: chrono::ParseError) -> Self {
        CoulombError::invalid_argument("datetime", &err.to_string())
    }
}
