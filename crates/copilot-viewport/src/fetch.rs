//! Fetching mesh bytes for a reference.

use crate::error::{ViewportError, ViewportResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns a mesh reference into raw bytes. The viewport only ever calls this when
/// the reference changes.
#[async_trait]
pub trait MeshFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> ViewportResult<Vec<u8>>;
}

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshSource {
    Remote(String),
    Local(PathBuf),
}

/// Fetches over HTTP, resolving backend-relative references (`/outputs/<id>.stl`)
/// against `base_url`. `file://` references are read from disk.
pub struct HttpMeshFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMeshFetcher {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    "http client builder failed; using defaults without timeouts"
                );
                reqwest::Client::new()
            });
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn resolve(&self, reference: &str) -> MeshSource {
        if let Some(path) = reference.strip_prefix("file://") {
            return MeshSource::Local(PathBuf::from(path));
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return MeshSource::Remote(reference.to_string());
        }
        MeshSource::Remote(format!(
            "{}/{}",
            self.base_url,
            reference.trim_start_matches('/')
        ))
    }
}

#[async_trait]
impl MeshFetcher for HttpMeshFetcher {
    async fn fetch(&self, reference: &str) -> ViewportResult<Vec<u8>> {
        match self.resolve(reference) {
            MeshSource::Local(path) => Ok(tokio::fs::read(&path).await?),
            MeshSource::Remote(url) => {
                let res = self.client.get(&url).send().await?;
                let status = res.status();
                if !status.is_success() {
                    return Err(ViewportError::Http {
                        url,
                        status: status.as_u16(),
                    });
                }
                Ok(res.bytes().await?.to_vec())
            }
        }
    }
}
