//! Result persistence keyed by file id.
//!
//! `JsonlResultStore` appends one JSON record per line and keeps a full
//! in-memory index for reads. Re-inserting a file id (the same file
//! re-uploaded and re-analyzed) overwrites the indexed entry; on reload
//! the last record for an id wins.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use logsift_commons::{FileId, LogStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Storage for completed analysis results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a result. Overwrites any earlier result for the same file.
    async fn insert(&self, stats: LogStats) -> Result<()>;

    /// Look up one result by file id.
    async fn select_by_file_id(&self, file_id: &FileId) -> Result<Option<LogStats>>;

    /// Every stored result, in no particular order.
    async fn select_all(&self) -> Result<Vec<LogStats>>;
}

struct StoreState {
    index: HashMap<FileId, LogStats>,
    file: File,
}

/// Result store backed by an append-only JSONL file.
pub struct JsonlResultStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonlResultStore {
    /// Open (or create) the store at `path`, loading existing records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create store dir: {}", e)))?;
        }

        let index = load_index(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::Unavailable(format!("open result store: {}", e)))?;

        Ok(Self {
            path,
            state: Mutex::new(StoreState { index, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_index(path: &Path) -> Result<HashMap<FileId, LogStats>> {
    let mut index = HashMap::new();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(index),
        Err(e) => return Err(StoreError::Unavailable(format!("read result store: {}", e))),
    };

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line =
            line.map_err(|e| StoreError::Unavailable(format!("read result line: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogStats>(&line) {
            Ok(stats) => {
                index.insert(stats.file_id.clone(), stats);
            }
            Err(e) => {
                log::warn!(
                    "Skipping corrupt result line {} in {}: {}",
                    line_no + 1,
                    path.display(),
                    e
                );
            }
        }
    }
    Ok(index)
}

#[async_trait]
impl ResultStore for JsonlResultStore {
    async fn insert(&self, stats: LogStats) -> Result<()> {
        let mut line = serde_json::to_string(&stats)
            .map_err(|e| StoreError::Unavailable(format!("encode result: {}", e)))?;
        line.push('\n');

        let mut state = self.state.lock();
        state
            .file
            .write_all(line.as_bytes())
            .map_err(|e| StoreError::Unavailable(format!("write result: {}", e)))?;
        state
            .file
            .flush()
            .map_err(|e| StoreError::Unavailable(format!("flush result store: {}", e)))?;
        state.index.insert(stats.file_id.clone(), stats);
        Ok(())
    }

    async fn select_by_file_id(&self, file_id: &FileId) -> Result<Option<LogStats>> {
        Ok(self.state.lock().index.get(file_id).cloned())
    }

    async fn select_all(&self) -> Result<Vec<LogStats>> {
        Ok(self.state.lock().index.values().cloned().collect())
    }
}
