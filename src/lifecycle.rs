//! Server lifecycle: bootstrap the stores, queue, worker pool, and event
//! bridge, then run the HTTP server until a termination signal arrives.

use crate::config::AppConfig;
use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};
use logsift_api::{routes, spawn_event_bridge, ApiState, ObserverRegistry};
use logsift_filestore::{LocalBlobStore, StagingArea};
use logsift_jobs::{Pipeline, WorkerPool};
use logsift_queue::JobQueue;
use logsift_store::JsonlResultStore;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Background services that outlive individual requests.
pub struct Services {
    pub state: ApiState,
    pub workers: WorkerPool,
    pub event_bridge: JoinHandle<()>,
}

/// Open the journal-backed queue and result store, wire the pipeline,
/// start the worker pool and the queue-to-observer event bridge.
pub async fn bootstrap(config: &AppConfig) -> Result<Services> {
    std::fs::create_dir_all(config.data_dir())
        .with_context(|| format!("create data dir {}", config.data_dir().display()))?;

    let queue = JobQueue::open(config.journal_path(), config.retry_policy())
        .context("open job queue journal")?;
    let recovered = queue.stats();
    if recovered.waiting > 0 {
        info!("Recovered {} waiting job(s) from journal", recovered.waiting);
    }

    let blobs = Arc::new(LocalBlobStore::new(config.blobs_dir()));
    let results = Arc::new(
        JsonlResultStore::open(config.results_path()).context("open result store")?,
    );
    let staging = StagingArea::new(config.staging_dir()).context("create staging area")?;

    let pipeline = Pipeline::new(
        blobs.clone(),
        results.clone(),
        staging,
        config.analyzer.keywords.clone(),
    )
    .map_err(|e| anyhow::anyhow!("build pipeline: {}", e))?;

    if config.analyzer.keywords.is_empty() {
        warn!("No analyzer keywords configured; keywordCounts will stay empty");
    } else {
        info!("Analyzer keywords: {:?}", config.analyzer.keywords);
    }

    let workers = WorkerPool::start(config.queue.concurrency, queue.clone(), pipeline);

    let registry = Arc::new(ObserverRegistry::new());
    let event_bridge = spawn_event_bridge(&queue, registry.clone());

    let state = ApiState {
        queue,
        blobs,
        results,
        registry,
    };
    Ok(Services {
        state,
        workers,
        event_bridge,
    })
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        let mut cors = Cors::default().allow_any_method().allow_any_header();
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors
    }
}

/// Start the HTTP server and manage graceful shutdown.
pub async fn run(config: &AppConfig, services: Services) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: POST /api/upload-logs, GET /api/queue-status, GET /api/stats, GET /ws");

    let Services {
        state,
        workers,
        event_bridge,
    } = services;

    let worker_count = if config.server.workers == 0 {
        num_cpus::get()
    } else {
        config.server.workers
    };

    let app_state = state.clone();
    let auth_token = config.auth.token.clone();
    let cors_origins = config.server.cors_allowed_origins.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(build_cors(&cors_origins))
            .configure(|cfg| routes::configure(cfg, app_state.clone(), &auth_token))
    })
    .workers(worker_count)
    .bind(&bind_addr)
    .with_context(|| format!("bind {}", bind_addr))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Server error: {}", e),
                Err(e) => log::error!("Server task failed: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");

            // Stop accepting new connections first.
            server_handle.stop(true).await;

            // Let in-flight jobs finish; nothing new gets leased.
            info!("Waiting for active jobs to complete...");
            workers.shutdown().await;

            event_bridge.abort();
            info!("Graceful shutdown complete");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
