//! Error types for logsift-store.

use thiserror::Error;

/// Errors surfaced by the result store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file is unreadable or unwritable.
    #[error("result store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
