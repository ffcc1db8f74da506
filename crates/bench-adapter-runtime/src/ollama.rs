//! Ollama adapter for local LLM serving

use crate::{Result, RuntimeError};
use bench_core::{
    GenerateRequest, GenerateResponse, InferenceClient, ModelEntry, PullProgress, RunningModel,
    ServerConfig,
};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Ollama adapter
pub struct OllamaAdapter {
    config: ServerConfig,
    client: Client,
}

/// Generate request as sent on the wire
#[derive(Debug, Serialize)]
struct OllamaGenerateBody<'a> {
    #[serde(flatten)]
    request: &'a GenerateRequest,
    stream: bool,
}

/// Model listing response (`/api/tags`)
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

/// Running models response (`/api/ps`)
#[derive(Debug, Deserialize)]
struct OllamaPsResponse {
    #[serde(default)]
    models: Vec<RunningModel>,
}

/// Pull request
#[derive(Debug, Serialize)]
struct OllamaPullBody<'a> {
    model: &'a str,
    stream: bool,
}

/// One line of the pull progress stream
#[derive(Debug, Deserialize)]
struct OllamaPullRecord {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Delete request
#[derive(Debug, Serialize)]
struct OllamaDeleteBody<'a> {
    model: &'a str,
}

/// Version response (`/api/version`)
#[derive(Debug, Deserialize)]
struct OllamaVersionResponse {
    version: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

impl OllamaAdapter {
    /// Create a new Ollama adapter
    pub fn new(config: ServerConfig) -> Result<Self> {
        info!("Creating Ollama adapter for endpoint: {}", config.endpoint);

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RuntimeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.as_str().trim_end_matches('/'), path)
    }

    async fn post_generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.url("api/generate");

        debug!(
            "Sending generate request to Ollama: model={} num_ctx={:?} keep_alive={:?}",
            request.model,
            request.context_size(),
            request.keep_alive
        );

        let body = OllamaGenerateBody { request, stream: false };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Generate request failed: {}", e)))?;

        let response = check_status(response, "Generate").await?;
        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(format!("Invalid generate response: {}", e)))?;

        Ok(generated)
    }

    async fn get_tags(&self) -> Result<Vec<ModelEntry>> {
        let url = self.url("api/tags");

        debug!("Fetching Ollama models from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Failed to list models: {}", e)))?;

        let response = check_status(response, "List models").await?;
        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(format!("Invalid models response: {}", e)))?;

        Ok(tags.models)
    }

    async fn get_ps(&self) -> Result<Vec<RunningModel>> {
        let url = self.url("api/ps");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Failed to list running models: {}", e)))?;

        let response = check_status(response, "List running models").await?;
        let ps: OllamaPsResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(format!("Invalid ps response: {}", e)))?;

        Ok(ps.models)
    }

    async fn stream_pull(&self, model: &str, progress: &mpsc::UnboundedSender<PullProgress>) -> Result<()> {
        let url = self.url("api/pull");

        info!("Pulling model {} from {}", model, url);

        let response = self
            .client
            .post(&url)
            .json(&OllamaPullBody { model, stream: true })
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Pull request failed: {}", e)))?;

        let mut response = check_status(response, "Pull").await?;

        // Records arrive as newline-delimited JSON split across arbitrary chunks
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(record) = parse_pull_line(&line)? {
                    let _ = progress.send(record);
                }
            }
        }
        if let Some(record) = parse_pull_line(&buffer)? {
            let _ = progress.send(record);
        }

        info!("Pull of {} completed", model);
        Ok(())
    }

    async fn send_delete(&self, model: &str) -> Result<()> {
        let url = self.url("api/delete");

        info!("Deleting model {}", model);

        let response = self
            .client
            .delete(&url)
            .json(&OllamaDeleteBody { model })
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Delete request failed: {}", e)))?;

        check_status(response, "Delete").await?;
        Ok(())
    }

    async fn get_version(&self) -> Result<String> {
        let url = self.url("api/version");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RuntimeError::Connection(format!("Version request failed: {}", e)))?;

        let response = check_status(response, "Version").await?;
        let version: OllamaVersionResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::InvalidResponse(format!("Invalid version response: {}", e)))?;

        Ok(version.version)
    }
}

#[async_trait]
impl InferenceClient for OllamaAdapter {
    async fn generate(&self, request: &GenerateRequest) -> bench_core::Result<GenerateResponse> {
        Ok(self.post_generate(request).await?)
    }

    async fn list(&self) -> bench_core::Result<Vec<ModelEntry>> {
        Ok(self.get_tags().await?)
    }

    async fn ps(&self) -> bench_core::Result<Vec<RunningModel>> {
        Ok(self.get_ps().await?)
    }

    async fn pull(&self, model: &str, progress: mpsc::UnboundedSender<PullProgress>) -> bench_core::Result<()> {
        Ok(self.stream_pull(model, &progress).await?)
    }

    async fn delete(&self, model: &str) -> bench_core::Result<()> {
        Ok(self.send_delete(model).await?)
    }

    async fn version(&self) -> bench_core::Result<String> {
        Ok(self.get_version().await?)
    }
}

/// Turn a non-2xx response into an error carrying the server's message
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<OllamaErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    warn!("{} failed: {} - {}", action, status, message);

    if status == StatusCode::NOT_FOUND {
        Err(RuntimeError::ModelNotFound(message))
    } else {
        Err(RuntimeError::Model(format!("{} failed: {} - {}", action, status, message)))
    }
}

/// Parse one line of the pull stream; blank lines yield `None`
fn parse_pull_line(line: &[u8]) -> Result<Option<PullProgress>> {
    let text = std::str::from_utf8(line)
        .map_err(|e| RuntimeError::InvalidResponse(format!("Pull stream is not UTF-8: {}", e)))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }

    let record: OllamaPullRecord = serde_json::from_str(text)
        .map_err(|e| RuntimeError::InvalidResponse(format!("Invalid pull record: {}", e)))?;

    if let Some(error) = record.error {
        return Err(RuntimeError::Model(format!("Pull failed: {}", error)));
    }

    let status = record.status.unwrap_or_default();
    let progress = match (record.completed, record.total) {
        (Some(completed), Some(total)) => PullProgress::Transfer { status, completed, total },
        _ => PullProgress::Phase { status },
    };
    Ok(Some(progress))
}
