//! Unified error types for caselog.
//!
//! This module provides the canonical error type used across the workspace.
//! Most failures in the pipeline are recovered locally (logged and skipped);
//! the variants here describe the ones that cross an API boundary.

use thiserror::Error;

/// All caselog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error (spill log or document store)
    #[error("storage error: {0}")]
    Storage(String),

    /// A paginated cursor was used past its keep-alive deadline
    #[error("cursor expired: {0}")]
    CursorExpired(String),

    /// Operation on a component that has already shut down
    #[error("closed: {0}")]
    Closed(String),
}

/// Result type for caselog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a serialization error.
    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }

    /// Check if this is an expired-cursor error.
    pub fn is_cursor_expired(&self) -> bool {
        matches!(self, Error::CursorExpired(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
