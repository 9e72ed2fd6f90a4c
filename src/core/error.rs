//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// This enum encapsulates all possible errors that can occur during
/// materialization, pattern compilation and persistence of a tree.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from a directory listing.
    ///
    /// The builder recovers from these locally; they never escape a traversal.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error during the parsing or building of a glob pattern.
    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] globset::Error),

    /// Represents a traversal root that is not a directory.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// The serialized tree could not be persisted to its destination.
    #[error("Failed to write tree to {1}: {0}")]
    Write(#[source] std::io::Error, PathBuf),

    /// Represents a failure to encode or decode the JSON representation.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking or being cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The materialization did not finish within the caller's deadline.
    #[error("Materialization timed out after {0:?}")]
    TimedOut(Duration),
}
