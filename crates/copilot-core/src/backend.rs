//! Generation backend contract and its reqwest implementation.

use crate::config::CopilotConfig;
use crate::error::{CopilotError, CopilotResult};
use crate::protocol::{
    interpret_generation, GenerateRequest, GenerationResult, RefineRequest, StatusResponse,
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::{Duration, Instant};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// The three calls the client makes. Implement for HTTP or for tests.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Fresh generation from a prompt.
    async fn generate(&self, prompt: &str) -> CopilotResult<GenerationResult>;

    /// Modify `original_code` according to `instruction`.
    async fn refine(&self, original_code: &str, instruction: &str)
        -> CopilotResult<GenerationResult>;

    /// Health probe.
    async fn status(&self) -> CopilotResult<StatusResponse>;
}

/// HTTP backend speaking JSON to `<base_url>/api/*`.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the given base URL (e.g. `http://127.0.0.1:8000`).
    ///
    /// Only the connect phase is bounded here; the overall generation deadline is
    /// enforced by the controller so every backend gets the same behaviour.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
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

    pub fn from_config(config: &CopilotConfig) -> Self {
        Self::new(&config.backend_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn post_generation<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> CopilotResult<GenerationResult> {
        let url = self.endpoint(path);
        let started = Instant::now();
        let res = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = res.status();
        let bytes = res.bytes().await?;
        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation backend answered"
        );
        interpret_generation(status.as_u16(), &bytes)
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate(&self, prompt: &str) -> CopilotResult<GenerationResult> {
        self.post_generation("generate", &GenerateRequest { prompt })
            .await
    }

    async fn refine(
        &self,
        original_code: &str,
        instruction: &str,
    ) -> CopilotResult<GenerationResult> {
        self.post_generation(
            "refine",
            &RefineRequest {
                original_code,
                instruction,
            },
        )
        .await
    }

    async fn status(&self) -> CopilotResult<StatusResponse> {
        let res = self
            .client
            .get(self.endpoint("status"))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CopilotError::MalformedBody(e.to_string()))
    }
}
