//! Staging area for in-flight downloads.
//!
//! Each processing attempt claims a staging path keyed by job id. The
//! returned `StagedFile` removes the file on drop, so the staging
//! directory stays clean whether the attempt succeeds or fails.

use crate::error::{FilestoreError, Result};
use logsift_commons::JobId;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding temporary copies of logs being analyzed.
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create the staging directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| FilestoreError::Storage(format!("create staging dir: {}", e)))?;
        Ok(Self { dir })
    }

    /// Claim a staging path for one processing attempt. Any leftover file
    /// at that path from an interrupted run is removed first.
    pub fn claim(&self, job_id: &JobId) -> Result<StagedFile> {
        let path = self.dir.join(format!("{}.log", job_id));
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| FilestoreError::Storage(format!("clear stale staging file: {}", e)))?;
        }
        Ok(StagedFile { path })
    }
}

/// A claimed staging path. Dropping it deletes the file.
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Failed to remove staged file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_staged_file_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path().join("staging")).unwrap();
        let job_id = JobId::new("j1");

        let path = {
            let staged = area.claim(&job_id).unwrap();
            fs::write(staged.path(), "data").unwrap();
            assert!(staged.path().exists());
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_claim_clears_stale_file() {
        let dir = TempDir::new().unwrap();
        let area = StagingArea::new(dir.path()).unwrap();
        let job_id = JobId::new("j1");

        fs::write(dir.path().join("j1.log"), "stale").unwrap();
        let staged = area.claim(&job_id).unwrap();
        assert!(!staged.path().exists());
    }
}
