//! Error types for the cave scanner.
//!
//! Only the boundary layers can fail: opening the image and parsing its
//! headers. The detector and section scanner are infallible.

use crate::formats::pe::PeError;
use crate::io::error::IoError;
use thiserror::Error;

/// Main error type for cave scanning operations.
#[derive(Debug, Error)]
pub enum CaveError {
    /// The image could not be opened or mapped
    #[error(transparent)]
    Io(#[from] IoError),

    /// The image is not a PE file we can walk
    #[error("Could not parse PE file: {0}")]
    InvalidFormat(#[from] PeError),

    /// Invalid scan configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rendering a report failed
    #[error("Report output failed: {0}")]
    Report(String),
}

/// Result type alias for cave scanning operations
pub type Result<T> = std::result::Result<T, CaveError>;

impl From<serde_json::Error> for CaveError {
    fn from(err: serde_json::Error) -> Self {
        CaveError::Report(err.to_string())
    }
}

impl From<std::io::Error> for CaveError {
    fn from(err: std::io::Error) -> Self {
        CaveError::Report(err.to_string())
    }
}
