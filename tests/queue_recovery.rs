//! Restart recovery: the journal brings jobs back after a simulated
//! crash, and an interrupted run counts as a spent attempt.

use bytes::Bytes;
use logsift_commons::{FileId, JobDescriptor, JobState, QueueEvent};
use logsift_filestore::{BlobStore, LocalBlobStore, StagingArea};
use logsift_jobs::{Pipeline, WorkerPool};
use logsift_queue::{JobQueue, RetryPolicy};
use logsift_store::JsonlResultStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO, Duration::ZERO)
}

#[tokio::test]
async fn interrupted_job_is_reprocessed_after_restart() {
    let dir = TempDir::new().unwrap();
    let journal = dir.path().join("queue.jsonl");

    let blobs = Arc::new(LocalBlobStore::new(dir.path().join("blobs")));
    let file_id = FileId::generate();
    let blob = blobs
        .store(&file_id, "app.log", Bytes::from("ERROR one\nERROR two\n"))
        .await
        .unwrap();

    // First process: the job is leased, then the process "crashes" with
    // the job still in flight.
    let job_id = {
        let queue = JobQueue::open(&journal, policy()).unwrap();
        let job_id = queue
            .enqueue(JobDescriptor {
                file_id: file_id.clone(),
                file_path: blob.file_path.clone(),
            })
            .unwrap();
        let leased = queue.lease(Duration::from_millis(100)).await.unwrap();
        assert_eq!(leased.job_id, job_id);
        job_id
    };

    // Second process: recovery re-queues the job with one attempt spent,
    // and a worker pool finishes it.
    let queue = JobQueue::open(&journal, policy()).unwrap();
    let recovered = queue.get(&job_id).unwrap();
    assert_eq!(recovered.state, JobState::Queued);
    assert_eq!(recovered.attempt, 1);

    let results = Arc::new(JsonlResultStore::open(dir.path().join("results.jsonl")).unwrap());
    let staging = StagingArea::new(dir.path().join("staging")).unwrap();
    let pipeline = Pipeline::new(blobs, results, staging, vec![]).unwrap();

    let mut events = queue.subscribe();
    let pool = WorkerPool::start(1, queue.clone(), pipeline);

    let stats = loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("timed out")
            .unwrap();
        if let QueueEvent::Completed { job_id: id, stats } = event {
            assert_eq!(id, job_id);
            break stats;
        }
    };
    pool.shutdown().await;

    assert_eq!(stats.error_count, 2);
    assert_eq!(queue.stats().completed, 1);
}

#[tokio::test]
async fn terminal_states_survive_restart() {
    let dir = TempDir::new().unwrap();
    let journal = dir.path().join("queue.jsonl");

    {
        let queue = JobQueue::open(&journal, RetryPolicy::new(1, Duration::ZERO, Duration::ZERO))
            .unwrap();
        let failed_id = queue
            .enqueue(JobDescriptor {
                file_id: FileId::new("ghost"),
                file_path: "missing.log".to_string(),
            })
            .unwrap();
        let _leased = queue.lease(Duration::from_millis(100)).await.unwrap();
        queue.fail(&failed_id, "resolution failed: no url").unwrap();
        assert_eq!(queue.stats().failed, 1);
    }

    let queue = JobQueue::open(&journal, RetryPolicy::new(1, Duration::ZERO, Duration::ZERO))
        .unwrap();
    let stats = queue.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.waiting, 0);
    // A permanently failed job is never leased again.
    assert!(queue.lease(Duration::from_millis(50)).await.is_none());
}
