//! # logsift-filestore
//!
//! File storage for uploaded logs: a `BlobStore` abstraction over where
//! raw log files live, a streaming downloader that fetches a file's URL
//! to local disk, and a staging area whose files are cleaned up when the
//! processing attempt ends.

pub mod blob;
pub mod download;
pub mod error;
pub mod staging;

pub use blob::{BlobStore, LocalBlobStore, StoredBlob};
pub use download::Downloader;
pub use error::{FilestoreError, Result};
pub use staging::{StagedFile, StagingArea};
