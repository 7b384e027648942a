//! Logsift server entrypoint.
//!
//! The heavy lifting (bootstrap, HTTP wiring, graceful shutdown) lives in
//! dedicated modules so this file remains a thin orchestrator.

mod config;
mod lifecycle;
mod logging;

use anyhow::Result;
use config::AppConfig;
use lifecycle::{bootstrap, run};
use log::info;
use std::env;

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path =
        env::var("LOGSIFT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("FATAL: invalid configuration ({}): {}", config_path, e);
            std::process::exit(1);
        }
    };

    // Logging before any other side effects
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
        &config.logging.format,
    )?;

    info!("Logsift v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Host: {}  Port: {}  Workers: {}  Data dir: {}",
        config.server.host,
        config.server.port,
        config.queue.concurrency,
        config.data_dir().display()
    );

    let services = bootstrap(&config).await?;
    run(&config, services).await
}
