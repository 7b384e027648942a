//! Error types for logsift-filestore.

use thiserror::Error;

/// Errors surfaced by blob storage, staging, and download.
#[derive(Error, Debug)]
pub enum FilestoreError {
    /// The requested file path does not exist in the store.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Fetching the file's URL failed (HTTP error, connection failure,
    /// interrupted stream).
    #[error("download failed: {0}")]
    Download(String),

    /// A URL whose scheme the downloader cannot handle.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// Local disk trouble while storing or staging.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for filestore operations.
pub type Result<T> = std::result::Result<T, FilestoreError>;
