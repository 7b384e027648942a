//! Error types for the processing pipeline.
//!
//! Each variant names the pipeline stage that failed; the message that
//! reaches the queue (and ultimately the `Failed` event) carries the
//! stage name via the `Display` impl.

use thiserror::Error;

/// A failed processing attempt, tagged by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The job's file path could not be resolved to a URL.
    #[error("resolution failed: {0}")]
    Resolution(String),

    /// Fetching the file to the staging area failed.
    #[error("download failed: {0}")]
    Download(String),

    /// The analyzer could not read or process the staged file.
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// The result could not be written to the result store.
    #[error("persist failed: {0}")]
    Persist(String),
}
