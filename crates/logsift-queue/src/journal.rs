//! Append-only JSONL journal of queue state transitions.
//!
//! One JSON record per line. The journal is the queue's durability story:
//! replaying it from the top reconstructs every job's latest state. A
//! truncated trailing line (crash mid-write) is skipped with a warning
//! rather than failing recovery.

use crate::error::{QueueError, Result};
use logsift_commons::{Job, JobId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One journaled queue transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalRecord {
    Enqueued { job: Job },
    Leased { job_id: JobId },
    /// Attempt failed but the policy allows another run.
    Retried { job_id: JobId, attempt: u32, error: String },
    Acked { job_id: JobId },
    /// Permanent failure, attempts exhausted.
    Failed { job_id: JobId, error: String },
}

/// Append-only journal file with line-oriented JSON records.
pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Journal {
    /// Open (or create) the journal at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| QueueError::Unavailable(format!("create journal dir: {}", e)))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| QueueError::Unavailable(format!("open journal: {}", e)))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one record and flush it to the OS.
    pub fn append(&self, record: &JournalRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| QueueError::Unavailable(format!("encode journal record: {}", e)))?;
        line.push('\n');

        let mut file = self.file.lock();
        file.write_all(line.as_bytes())
            .map_err(|e| QueueError::Unavailable(format!("write journal: {}", e)))?;
        file.flush()
            .map_err(|e| QueueError::Unavailable(format!("flush journal: {}", e)))?;
        Ok(())
    }

    /// Read every intact record from the journal, oldest first.
    pub fn replay(&self) -> Result<Vec<JournalRecord>> {
        let file = File::open(&self.path)
            .map_err(|e| QueueError::Unavailable(format!("read journal: {}", e)))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| QueueError::Unavailable(format!("read journal line: {}", e)))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // Most likely a torn write from a crash; keep what we have.
                    log::warn!(
                        "Skipping corrupt journal line {} in {}: {}",
                        line_no + 1,
                        self.path.display(),
                        e
                    );
                }
            }
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
