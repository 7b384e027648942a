//! Per-job processing pipeline: resolve, download, analyze, persist.
//!
//! Every stage failure maps to one `PipelineError` variant; the worker
//! converts any of them into a queue-level `fail`. The staged local copy
//! is removed on every exit path by the `StagedFile` drop guard.

use crate::analyzer::analyze_file;
use crate::error::PipelineError;
use chrono::Utc;
use logsift_commons::{Job, LogStats};
use logsift_filestore::{BlobStore, Downloader, FilestoreError, StagingArea};
use logsift_store::ResultStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared pipeline instance; each worker slot runs jobs through a clone.
#[derive(Clone)]
pub struct Pipeline {
    blobs: Arc<dyn BlobStore>,
    results: Arc<dyn ResultStore>,
    downloader: Arc<Downloader>,
    staging: Arc<StagingArea>,
    keywords: Arc<Vec<String>>,
}

impl Pipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        results: Arc<dyn ResultStore>,
        staging: StagingArea,
        keywords: Vec<String>,
    ) -> Result<Self, PipelineError> {
        let downloader = Downloader::new()
            .map_err(|e| PipelineError::Download(e.to_string()))?;
        Ok(Self {
            blobs,
            results,
            downloader: Arc::new(downloader),
            staging: Arc::new(staging),
            keywords: Arc::new(keywords),
        })
    }

    /// Run one job to completion. Progress percentages are pushed through
    /// `on_progress` as analysis advances.
    pub async fn process(
        &self,
        job: &Job,
        on_progress: impl Fn(u8) + Send + Sync + 'static,
    ) -> Result<LogStats, PipelineError> {
        let url = self
            .blobs
            .resolve_url(&job.file_path)
            .await
            .map_err(|e| match e {
                FilestoreError::NotFound(path) => {
                    PipelineError::Resolution(format!("no url for {}", path))
                }
                other => PipelineError::Resolution(other.to_string()),
            })?;

        // Staged copy is removed when `staged` drops, on every path out
        // of this function.
        let staged = self
            .staging
            .claim(&job.job_id)
            .map_err(|e| PipelineError::Download(e.to_string()))?;

        self.downloader
            .fetch(&url, staged.path())
            .await
            .map_err(|e| PipelineError::Download(e.to_string()))?;

        let raw = self.analyze(staged.path().to_path_buf(), on_progress).await?;

        let stats = LogStats {
            file_id: job.file_id.clone(),
            file_path: job.file_path.clone(),
            error_count: raw.error_count,
            keyword_counts: raw.keyword_counts,
            unique_ips: raw.unique_ips,
            processed_at: Utc::now(),
        };

        self.results
            .insert(stats.clone())
            .await
            .map_err(|e| PipelineError::Persist(e.to_string()))?;

        Ok(stats)
    }

    /// The analyzer is synchronous, blocking I/O; run it off the async
    /// runtime's worker threads.
    async fn analyze(
        &self,
        path: PathBuf,
        on_progress: impl Fn(u8) + Send + Sync + 'static,
    ) -> Result<crate::analyzer::RawStats, PipelineError> {
        let keywords = Arc::clone(&self.keywords);
        tokio::task::spawn_blocking(move || {
            analyze_file(&path, &keywords, |percent| on_progress(percent))
        })
        .await
        .map_err(|e| PipelineError::Analysis(format!("analyzer task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use logsift_commons::{FileId, JobDescriptor, JobId};
    use logsift_filestore::LocalBlobStore;
    use logsift_store::JsonlResultStore;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        pipeline: Pipeline,
        blobs: Arc<LocalBlobStore>,
        results: Arc<JsonlResultStore>,
        staging_dir: PathBuf,
    }

    fn fixture(keywords: &[&str]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(dir.path().join("blobs")));
        let results =
            Arc::new(JsonlResultStore::open(dir.path().join("results.jsonl")).unwrap());
        let staging_dir = dir.path().join("staging");
        let staging = StagingArea::new(&staging_dir).unwrap();

        let pipeline = Pipeline::new(
            blobs.clone(),
            results.clone(),
            staging,
            keywords.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();

        Fixture {
            _dir: dir,
            pipeline,
            blobs,
            results,
            staging_dir,
        }
    }

    async fn upload_job(fx: &Fixture, name: &str, content: &str) -> Job {
        let file_id = FileId::generate();
        let blob = fx
            .blobs
            .store(&file_id, name, Bytes::from(content.to_string()))
            .await
            .unwrap();
        Job::queued(
            JobId::generate(),
            JobDescriptor {
                file_id,
                file_path: blob.file_path,
            },
        )
    }

    #[tokio::test]
    async fn test_process_persists_stats() {
        let fx = fixture(&["disk"]);
        let job = upload_job(&fx, "app.log", "ERROR disk full 10.0.0.5\nINFO ok\n").await;

        let stats = fx.pipeline.process(&job, |_| {}).await.unwrap();
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.keyword_counts["disk"], 1);
        assert_eq!(stats.unique_ips, vec!["10.0.0.5".to_string()]);

        let stored = fx
            .results
            .select_by_file_id(&job.file_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.error_count, 1);
    }

    #[tokio::test]
    async fn test_missing_blob_is_a_resolution_error() {
        let fx = fixture(&[]);
        let job = Job::queued(
            JobId::generate(),
            JobDescriptor {
                file_id: FileId::new("ghost"),
                file_path: "ghost.log".to_string(),
            },
        );

        let err = fx.pipeline.process(&job, |_| {}).await.unwrap_err();
        assert!(matches!(err, PipelineError::Resolution(_)));
        // Nothing persisted for a failed attempt.
        assert!(fx
            .results
            .select_by_file_id(&FileId::new("ghost"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_staging_file_is_cleaned_up_after_success() {
        let fx = fixture(&[]);
        let job = upload_job(&fx, "app.log", "INFO one\n").await;

        fx.pipeline.process(&job, |_| {}).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(&fx.staging_dir)
            .unwrap()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_progress_reaches_observers() {
        let fx = fixture(&[]);
        let content: String = (0..40).map(|i| format!("line {}\n", i)).collect();
        let job = upload_job(&fx, "big.log", &content).await;

        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        fx.pipeline
            .process(&job, move |p| sink.lock().push(p))
            .await
            .unwrap();

        let seen = seen.lock();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
