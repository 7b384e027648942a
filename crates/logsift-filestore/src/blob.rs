//! Blob storage for raw log files.
//!
//! The pipeline never reads blobs directly; it asks the store to resolve
//! a stored path to a fetchable URL and hands that URL to the downloader.
//! `LocalBlobStore` keeps blobs on local disk and resolves to `file://`
//! URLs, which is also what the integration tests run against.

use crate::error::{FilestoreError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use logsift_commons::FileId;
use std::path::{Path, PathBuf};

/// Metadata returned after storing a blob.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Store-relative path; this is what gets recorded on the job.
    pub file_path: String,
    /// Size in bytes.
    pub size: u64,
}

/// Where uploaded log files live.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist an uploaded file and return its store-relative path.
    async fn store(&self, file_id: &FileId, original_name: &str, data: Bytes)
        -> Result<StoredBlob>;

    /// Resolve a stored path to a URL the downloader can fetch.
    /// Fails with `NotFound` when the path does not exist.
    async fn resolve_url(&self, file_path: &str) -> Result<String>;

    /// Read a stored blob back in full. Serves the download endpoint.
    async fn load(&self, file_path: &str) -> Result<Bytes>;
}

/// Blob store backed by a local directory.
pub struct LocalBlobStore {
    base_dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn full_path(&self, file_path: &str) -> PathBuf {
        self.base_dir.join(file_path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        file_id: &FileId,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredBlob> {
        let file_path = format!("{}-{}", file_id, sanitize_file_name(original_name));
        let full = self.full_path(&file_path);

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| FilestoreError::Storage(format!("create blob dir: {}", e)))?;

        let size = data.len() as u64;
        tokio::fs::write(&full, &data)
            .await
            .map_err(|e| FilestoreError::Storage(format!("write blob {}: {}", file_path, e)))?;

        log::debug!("Stored blob {} ({} bytes)", file_path, size);
        Ok(StoredBlob { file_path, size })
    }

    async fn resolve_url(&self, file_path: &str) -> Result<String> {
        let full = self.full_path(file_path);
        if !tokio::fs::try_exists(&full)
            .await
            .map_err(|e| FilestoreError::Storage(format!("stat blob {}: {}", file_path, e)))?
        {
            return Err(FilestoreError::NotFound(file_path.to_string()));
        }
        let absolute = full
            .canonicalize()
            .map_err(|e| FilestoreError::Storage(format!("canonicalize {}: {}", file_path, e)))?;
        Ok(format!("file://{}", absolute.display()))
    }

    async fn load(&self, file_path: &str) -> Result<Bytes> {
        let full = self.full_path(file_path);
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FilestoreError::NotFound(file_path.to_string()))
            }
            Err(e) => Err(FilestoreError::Storage(format!(
                "read blob {}: {}",
                file_path, e
            ))),
        }
    }
}

/// Strip anything that could escape the blob directory from an uploaded
/// filename. Empty results fall back to a fixed name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .scan(0usize, |dots, c| {
            // Collapse dot runs so "../../" cannot survive sanitization.
            if c == '.' {
                *dots += 1;
                if *dots > 1 {
                    return Some(None);
                }
            } else {
                *dots = 0;
            }
            Some(Some(c))
        })
        .flatten()
        .take(128)
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload.log".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("server-01.log"), "server-01.log");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".etcpasswd");
        assert_eq!(sanitize_file_name("app log.txt"), "applog.txt");
        assert_eq!(sanitize_file_name("///"), "upload.log");
    }

    #[tokio::test]
    async fn test_store_then_resolve() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let file_id = FileId::new("f1");

        let blob = store
            .store(&file_id, "server.log", Bytes::from("line one\n"))
            .await
            .unwrap();
        assert_eq!(blob.size, 9);
        assert!(blob.file_path.starts_with("f1-"));

        let url = store.resolve_url(&blob.file_path).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("server.log"));

        let data = store.load(&blob.file_path).await.unwrap();
        assert_eq!(&data[..], b"line one\n");
    }

    #[tokio::test]
    async fn test_resolve_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let err = store.resolve_url("nope.log").await.unwrap_err();
        assert!(matches!(err, FilestoreError::NotFound(_)));
    }
}
