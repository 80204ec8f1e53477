//! Structured error types for the memory store
//!
//! Every operation returns [`MemoryError`] on failure. The protocol adapter
//! turns each variant into a failed result with a stable error code, so no
//! error ever escapes to the caller as a crash.

use std::path::PathBuf;
use thiserror::Error;

use crate::memory::Category;

/// Primary error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    // =========================================================================
    // Caller Errors (fail fast, before any lock or I/O)
    // =========================================================================
    /// Entry or request failed schema validation
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Mutation attempted on a system-managed category
    #[error("category '{category}' is read-only")]
    ReadOnlyViolation { category: Category },

    /// Category name outside the fixed set
    #[error("unknown category: {name}")]
    UnknownCategory { name: String },

    /// Malformed protocol request
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Key absent from the category
    #[error("key '{key}' not found in {category}")]
    NotFound { category: Category, key: String },

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// Filesystem failure while reading or writing a category file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MemoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code for the protocol boundary
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::ReadOnlyViolation { .. } => "READ_ONLY_VIOLATION",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),

            Self::Validation { .. }
            | Self::ReadOnlyViolation { .. }
            | Self::UnknownCategory { .. }
            | Self::InvalidRequest { .. }
            | Self::NotFound { .. }
            | Self::Serialization(_) => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::ReadOnlyViolation { category } => format!(
                "'{}' is managed by the system and can only be read.",
                category
            ),
            Self::NotFound { category, key } => {
                format!("No memory with key '{}' in {}.", key, category)
            }
            Self::Io { path, .. } => format!(
                "Could not access {}. The change was not saved.",
                path.display()
            ),
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using MemoryError
pub type Result<T> = std::result::Result<T, MemoryError>;
