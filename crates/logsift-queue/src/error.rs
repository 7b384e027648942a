//! Error types for logsift-queue.

use thiserror::Error;

/// Errors surfaced by queue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue backend (journal) is unreachable or unwritable.
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    /// A job id that the queue has never seen.
    #[error("unknown job: {0}")]
    UnknownJob(String),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
