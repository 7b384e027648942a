//! End-to-end pipeline tests: upload a blob, enqueue its job, run the
//! worker pool, and observe the full event sequence.

use bytes::Bytes;
use logsift_commons::{FileId, JobDescriptor, JobId, QueueEvent};
use logsift_filestore::{BlobStore, LocalBlobStore, StagingArea};
use logsift_jobs::{Pipeline, WorkerPool};
use logsift_queue::{JobQueue, RetryPolicy};
use logsift_store::{JsonlResultStore, ResultStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    queue: JobQueue,
    pipeline: Pipeline,
    blobs: Arc<LocalBlobStore>,
    results: Arc<JsonlResultStore>,
}

fn harness(keywords: &[&str], policy: RetryPolicy) -> Harness {
    let dir = TempDir::new().unwrap();
    let queue = JobQueue::open(dir.path().join("queue.jsonl"), policy).unwrap();
    let blobs = Arc::new(LocalBlobStore::new(dir.path().join("blobs")));
    let results = Arc::new(JsonlResultStore::open(dir.path().join("results.jsonl")).unwrap());
    let staging = StagingArea::new(dir.path().join("staging")).unwrap();
    let pipeline = Pipeline::new(
        blobs.clone(),
        results.clone(),
        staging,
        keywords.iter().map(|s| s.to_string()).collect(),
    )
    .unwrap();

    Harness {
        _dir: dir,
        queue,
        pipeline,
        blobs,
        results,
    }
}

async fn upload(h: &Harness, name: &str, content: &str) -> (FileId, JobId) {
    let file_id = FileId::generate();
    let blob = h
        .blobs
        .store(&file_id, name, Bytes::from(content.to_string()))
        .await
        .unwrap();
    let job_id = h
        .queue
        .enqueue(JobDescriptor {
            file_id: file_id.clone(),
            file_path: blob.file_path,
        })
        .unwrap();
    (file_id, job_id)
}

async fn next_event(events: &mut tokio::sync::broadcast::Receiver<QueueEvent>) -> QueueEvent {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for queue event")
        .expect("event channel closed")
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_100_before_completion() {
    let h = harness(&["disk"], RetryPolicy::default());
    let mut events = h.queue.subscribe();

    let content: String = (0..200)
        .map(|i| format!("line {} ERROR disk 10.0.0.{}\n", i, i % 7))
        .collect();
    let (file_id, job_id) = upload(&h, "big.log", &content).await;

    let pool = WorkerPool::start(2, h.queue.clone(), h.pipeline.clone());

    let mut percents: Vec<u8> = Vec::new();
    let terminal = loop {
        match next_event(&mut events).await {
            QueueEvent::Progress { job_id: id, percent } => {
                assert_eq!(id, job_id);
                percents.push(percent);
            }
            terminal => break terminal,
        }
    };
    pool.shutdown().await;

    // Non-decreasing, within [0, 100], ending at exactly 100.
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(percents.iter().all(|p| *p <= 100));
    assert_eq!(*percents.last().unwrap(), 100);

    match terminal {
        QueueEvent::Completed { job_id: id, stats } => {
            assert_eq!(id, job_id);
            assert_eq!(stats.file_id, file_id);
            assert_eq!(stats.error_count, 200);
            assert_eq!(stats.keyword_counts["disk"], 200);
            assert_eq!(stats.unique_ips.len(), 7);
        }
        other => panic!("expected Completed, got {:?}", other),
    }

    // The result store holds exactly this file's stats.
    let stored = h.results.select_by_file_id(&file_id).await.unwrap().unwrap();
    assert_eq!(stored.error_count, 200);
}

#[tokio::test]
async fn empty_file_completes_with_zero_counts_and_single_100() {
    let h = harness(&["disk"], RetryPolicy::default());
    let mut events = h.queue.subscribe();
    let (_file_id, job_id) = upload(&h, "empty.log", "").await;

    let pool = WorkerPool::start(1, h.queue.clone(), h.pipeline.clone());

    let mut percents = Vec::new();
    let terminal = loop {
        match next_event(&mut events).await {
            QueueEvent::Progress { percent, .. } => percents.push(percent),
            terminal => break terminal,
        }
    };
    pool.shutdown().await;

    // The analyzer's immediate 100 is the only progress event; the worker
    // does not emit a second one.
    assert_eq!(percents, vec![100]);
    match terminal {
        QueueEvent::Completed { job_id: id, stats } => {
            assert_eq!(id, job_id);
            assert_eq!(stats.error_count, 0);
            assert!(stats.keyword_counts.is_empty());
            assert!(stats.unique_ips.is_empty());
        }
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn reprocessing_identical_bytes_yields_identical_stats() {
    let h = harness(&["disk", "timeout"], RetryPolicy::default());
    let content = "ERROR disk full 10.0.0.5\nWARN timeout 10.0.0.6\nINFO ok\n";
    let (file_a, _) = upload(&h, "a.log", content).await;
    let (file_b, _) = upload(&h, "b.log", content).await;

    let pool = WorkerPool::start(2, h.queue.clone(), h.pipeline.clone());
    wait_until(&h.queue, |s| s.completed == 2).await;
    pool.shutdown().await;

    let a = h.results.select_by_file_id(&file_a).await.unwrap().unwrap();
    let b = h.results.select_by_file_id(&file_b).await.unwrap().unwrap();
    assert_eq!(a.error_count, b.error_count);
    assert_eq!(a.keyword_counts, b.keyword_counts);
    assert_eq!(a.unique_ips, b.unique_ips);
}

#[tokio::test]
async fn leased_jobs_never_exceed_pool_size() {
    let h = harness(&[], RetryPolicy::default());
    let content: String = (0..2_000).map(|i| format!("line {}\n", i)).collect();
    for n in 0..6 {
        upload(&h, &format!("f{}.log", n), &content).await;
    }

    let pool = WorkerPool::start(2, h.queue.clone(), h.pipeline.clone());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let stats = h.queue.stats();
        assert!(stats.active <= 2, "observed {} active jobs", stats.active);
        if stats.completed == 6 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "jobs did not finish in time: {:?}",
            stats
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    pool.shutdown().await;
}

#[tokio::test]
async fn failed_attempts_persist_no_stats() {
    let h = harness(&[], RetryPolicy::new(2, Duration::ZERO, Duration::ZERO));
    let mut events = h.queue.subscribe();

    // file_path points at nothing: resolution fails every attempt.
    let ghost = FileId::new("ghost");
    h.queue
        .enqueue(JobDescriptor {
            file_id: ghost.clone(),
            file_path: "missing.log".to_string(),
        })
        .unwrap();

    let pool = WorkerPool::start(1, h.queue.clone(), h.pipeline.clone());
    loop {
        if let QueueEvent::Failed { error, .. } = next_event(&mut events).await {
            assert!(error.contains("resolution failed"));
            break;
        }
    }
    pool.shutdown().await;

    assert!(h.results.select_by_file_id(&ghost).await.unwrap().is_none());
    assert_eq!(h.queue.stats().failed, 1);
}

async fn wait_until(queue: &JobQueue, done: impl Fn(logsift_queue::QueueStats) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !done(queue.stats()) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time: {:?}",
            queue.stats()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
