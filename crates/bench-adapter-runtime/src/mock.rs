//! Mock inference client for testing

use bench_core::{
    Error, GenerateRequest, GenerateResponse, InferenceClient, ModelEntry, PullProgress, Result,
    RunningModel,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Scripted outcome of one generate call
#[derive(Debug, Clone)]
enum MockOutcome {
    Respond { eval_count: u64, eval_duration: i64 },
    Fail(String),
}

/// In-memory [`InferenceClient`] with scripted responses.
///
/// Unless overridden, every generate call answers 100 tokens in two
/// seconds, i.e. 50 tokens per second.
#[derive(Clone)]
pub struct MockInferenceClient {
    models: Arc<RwLock<Vec<ModelEntry>>>,
    running: Arc<RwLock<Vec<RunningModel>>>,
    outcomes: HashMap<(String, Option<u32>), MockOutcome>,
    pull_script: Vec<PullProgress>,
    pull_error: Option<String>,
    version: String,
    unreachable: bool,
    requests: Arc<RwLock<Vec<GenerateRequest>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    pulled: Arc<RwLock<Vec<String>>>,
}

impl MockInferenceClient {
    /// Create a new mock client with no models
    pub fn new() -> Self {
        Self {
            models: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(RwLock::new(Vec::new())),
            outcomes: HashMap::new(),
            pull_script: Vec::new(),
            pull_error: None,
            version: "0.0.0-mock".to_string(),
            unreachable: false,
            requests: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            pulled: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Install models by name
    pub fn with_models(mut self, names: &[&str]) -> Self {
        let entries = names.iter().map(|name| mock_entry(name)).collect();
        self.models = Arc::new(RwLock::new(entries));
        self
    }

    /// Set the models reported as resident
    pub fn with_running(mut self, running: Vec<RunningModel>) -> Self {
        self.running = Arc::new(RwLock::new(running));
        self
    }

    /// Script the answer for one model at one context size
    pub fn with_response(mut self, model: &str, num_ctx: u32, eval_count: u64, eval_duration: i64) -> Self {
        self.outcomes.insert(
            (model.to_string(), Some(num_ctx)),
            MockOutcome::Respond { eval_count, eval_duration },
        );
        self
    }

    /// Script a server error for one model at one context size
    pub fn with_failure(mut self, model: &str, num_ctx: u32, message: &str) -> Self {
        self.outcomes
            .insert((model.to_string(), Some(num_ctx)), MockOutcome::Fail(message.to_string()));
        self
    }

    /// Progress records replayed by `pull`
    pub fn with_pull_progress(mut self, records: Vec<PullProgress>) -> Self {
        self.pull_script = records;
        self
    }

    /// Make `pull` fail after replaying its progress records
    pub fn with_pull_error(mut self, message: &str) -> Self {
        self.pull_error = Some(message.to_string());
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Fail every call with a network error
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Generate requests received so far
    pub async fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.read().await.clone()
    }

    /// Models deleted so far
    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Models pulled so far
    pub async fn pulled(&self) -> Vec<String> {
        self.pulled.read().await.clone()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            Err(Error::network("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.check_reachable()?;
        self.requests.write().await.push(request.clone());

        let key = (request.model.clone(), request.context_size());
        let outcome = self.outcomes.get(&key).cloned();
        debug!("Mock generate for {:?}: {:?}", key, outcome);

        let (eval_count, eval_duration) = match outcome {
            Some(MockOutcome::Fail(message)) => return Err(Error::server(message)),
            Some(MockOutcome::Respond { eval_count, eval_duration }) => (eval_count, eval_duration),
            None if request.prompt.is_none() => (0, 0),
            None => (100, 2_000_000_000),
        };

        Ok(GenerateResponse {
            model: Some(request.model.clone()),
            response: Some("mock response".to_string()),
            done: Some(true),
            eval_count: Some(eval_count),
            eval_duration: Some(eval_duration),
            ..Default::default()
        })
    }

    async fn list(&self) -> Result<Vec<ModelEntry>> {
        self.check_reachable()?;
        Ok(self.models.read().await.clone())
    }

    async fn ps(&self) -> Result<Vec<RunningModel>> {
        self.check_reachable()?;
        Ok(self.running.read().await.clone())
    }

    async fn pull(&self, model: &str, progress: mpsc::UnboundedSender<PullProgress>) -> Result<()> {
        self.check_reachable()?;

        for record in &self.pull_script {
            let _ = progress.send(record.clone());
        }
        if let Some(message) = &self.pull_error {
            return Err(Error::server(message.clone()));
        }

        self.pulled.write().await.push(model.to_string());
        self.models.write().await.push(mock_entry(model));
        Ok(())
    }

    async fn delete(&self, model: &str) -> Result<()> {
        self.check_reachable()?;

        let mut models = self.models.write().await;
        let before = models.len();
        models.retain(|m| m.name != model);
        if models.len() == before {
            return Err(Error::not_found(format!("model '{}' not found", model)));
        }

        self.deleted.write().await.push(model.to_string());
        Ok(())
    }

    async fn version(&self) -> Result<String> {
        self.check_reachable()?;
        Ok(self.version.clone())
    }
}

fn mock_entry(name: &str) -> ModelEntry {
    ModelEntry {
        name: name.to_string(),
        model: Some(name.to_string()),
        size: 0,
        modified_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_generate_is_fifty_tps() {
        let client = MockInferenceClient::new();
        let response = client
            .generate(&GenerateRequest::new("llama3.2:3b", "hi").with_context_size(4096))
            .await
            .unwrap();

        assert_eq!(response.eval_count, Some(100));
        assert_eq!(response.eval_duration, Some(2_000_000_000));
        assert_eq!(client.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let client = MockInferenceClient::new().with_failure("big:70b", 32768, "out of memory");

        let err = client
            .generate(&GenerateRequest::new("big:70b", "hi").with_context_size(32768))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of memory"));

        // Other sizes are unaffected
        assert!(client
            .generate(&GenerateRequest::new("big:70b", "hi").with_context_size(4096))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_pull_then_delete() {
        let client = MockInferenceClient::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        client.pull("phi3:mini", tx).await.unwrap();
        assert_eq!(client.list().await.unwrap().len(), 1);

        client.delete("phi3:mini").await.unwrap();
        assert!(client.list().await.unwrap().is_empty());
        assert_eq!(client.delete("phi3:mini").await.unwrap_err().category(), "not_found");
    }
}
