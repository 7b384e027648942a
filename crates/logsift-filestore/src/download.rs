//! Streaming download of a resolved blob URL to local disk.
//!
//! HTTP(S) URLs stream chunk by chunk so large log files never sit in
//! memory. `file://` URLs (the local blob store) short-circuit to a
//! filesystem copy.

use crate::error::{FilestoreError, Result};
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches blob URLs to a local destination path.
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| FilestoreError::Download(format!("build http client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch `url` into `dest`, returning the number of bytes written.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(path) = url.strip_prefix("file://") {
            return copy_local(path, dest).await;
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url, dest).await;
        }
        Err(FilestoreError::UnsupportedScheme(url.to_string()))
    }

    async fn fetch_http(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilestoreError::Download(format!("request {}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| FilestoreError::Download(format!("fetch {}: {}", url, e)))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FilestoreError::Storage(format!("create {}: {}", dest.display(), e)))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| FilestoreError::Download(format!("stream {}: {}", url, e)))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FilestoreError::Storage(format!("write {}: {}", dest.display(), e)))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| FilestoreError::Storage(format!("flush {}: {}", dest.display(), e)))?;

        log::debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}

async fn copy_local(src: &str, dest: &Path) -> Result<u64> {
    tokio::fs::copy(src, dest)
        .await
        .map_err(|e| FilestoreError::Download(format!("copy {}: {}", src, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_file_url_copies_content() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.log");
        tokio::fs::write(&src, "ERROR boom\n").await.unwrap();

        let dest = dir.path().join("staged.log");
        let downloader = Downloader::new().unwrap();
        let url = format!("file://{}", src.display());

        let written = downloader.fetch(&url, &dest).await.unwrap();
        assert_eq!(written, 11);
        assert_eq!(tokio::fs::read_to_string(&dest).await.unwrap(), "ERROR boom\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_url_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("staged.log");
        let downloader = Downloader::new().unwrap();

        let err = downloader
            .fetch("file:///does/not/exist.log", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FilestoreError::Download(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_rejected() {
        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new().unwrap();
        let err = downloader
            .fetch("ftp://example.com/a.log", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FilestoreError::UnsupportedScheme(_)));
    }
}
