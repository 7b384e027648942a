//! Application configuration.
//!
//! Loaded from `config.toml`, then overridden by `LOGSIFT_*` environment
//! variables, then validated. A missing config file falls back to
//! defaults so the server can run out of the box.

use anyhow::{bail, Context};
use logsift_queue::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 0 means one worker per CPU core.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Bearer token required on every `/api` request.
    #[serde(default = "default_auth_token")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Keywords counted per line during analysis.
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory for blobs, staging, the queue journal, and results.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// "compact" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl AppConfig {
    /// Load from `path` (defaults when the file is absent), apply
    /// environment overrides, validate.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parse config file {}", path.display()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over the file.
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(host) = env::var("LOGSIFT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("LOGSIFT_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid LOGSIFT_PORT '{}'", port))?;
        }
        if let Ok(token) = env::var("LOGSIFT_AUTH_TOKEN") {
            self.auth.token = token;
        }
        if let Ok(keywords) = env::var("LOGSIFT_KEYWORDS") {
            self.analyzer.keywords = keywords
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Ok(concurrency) = env::var("LOGSIFT_CONCURRENCY") {
            self.queue.concurrency = concurrency
                .parse()
                .with_context(|| format!("invalid LOGSIFT_CONCURRENCY '{}'", concurrency))?;
        }
        if let Ok(attempts) = env::var("LOGSIFT_MAX_ATTEMPTS") {
            self.queue.max_attempts = attempts
                .parse()
                .with_context(|| format!("invalid LOGSIFT_MAX_ATTEMPTS '{}'", attempts))?;
        }
        if let Ok(base) = env::var("LOGSIFT_BACKOFF_BASE_MS") {
            self.queue.backoff_base_ms = base
                .parse()
                .with_context(|| format!("invalid LOGSIFT_BACKOFF_BASE_MS '{}'", base))?;
        }
        if let Ok(dir) = env::var("LOGSIFT_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Ok(level) = env::var("LOGSIFT_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.auth.token.trim().is_empty() {
            bail!("auth.token must not be empty (set LOGSIFT_AUTH_TOKEN)");
        }
        if self.queue.concurrency == 0 {
            bail!("queue.concurrency must be at least 1");
        }
        if self.queue.max_attempts == 0 {
            bail!("queue.max_attempts must be at least 1");
        }
        if self.queue.backoff_cap_ms < self.queue.backoff_base_ms {
            bail!("queue.backoff_cap_ms must be >= queue.backoff_base_ms");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.queue.max_attempts,
            Duration::from_millis(self.queue.backoff_base_ms),
            Duration::from_millis(self.queue.backoff_cap_ms),
        )
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir().join("blobs")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir().join("staging")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir().join("queue.jsonl")
    }

    pub fn results_path(&self) -> PathBuf {
        self.data_dir().join("results.jsonl")
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token: default_auth_token(),
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
        }
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self { keywords: vec![] }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_file(),
            log_to_console: true,
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_auth_token() -> String {
    // Intentionally empty: forces operators to set a real token via the
    // config file or LOGSIFT_AUTH_TOKEN before the server will start.
    String::new()
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    30_000
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/logsift.log".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_true() -> bool {
    true
}
