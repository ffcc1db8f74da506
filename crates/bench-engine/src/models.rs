//! Model catalog and management actions

use crate::events::{BenchEvent, EventSink};
use bench_adapter_runtime::{check_health, HealthInfo, ServiceManager};
use bench_core::{
    CatalogConfig, GenerateRequest, InferenceClient, ModelEntry, PullProgress, Result, RunningModel,
};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Installed models, split into everything and the locally runnable subset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelCatalog {
    /// Every installed model; the deletion selector
    pub all: Vec<String>,
    /// Models without the remote-only marker; the benchmark selectors
    pub local: Vec<String>,
}

impl ModelCatalog {
    pub fn from_entries(entries: &[ModelEntry], remote_marker: &str) -> Self {
        let all: Vec<String> = entries.iter().map(|e| e.id().to_string()).collect();
        let local = entries
            .iter()
            .filter(|e| !e.is_remote(remote_marker))
            .map(|e| e.id().to_string())
            .collect();
        Self { all, local }
    }

    /// Default model for a stress sweep
    pub fn default_bench_model(&self) -> Option<&str> {
        self.local.first().map(String::as_str)
    }

    /// Comparison partner: the first local model other than `model_a`
    pub fn default_partner(&self, model_a: &str) -> Option<&str> {
        self.local
            .iter()
            .map(String::as_str)
            .find(|model| *model != model_a)
    }

    /// Default target for deletion
    pub fn default_delete_target(&self) -> Option<&str> {
        self.all.first().map(String::as_str)
    }
}

/// Model management actions, each reporting through an [`EventSink`]
#[derive(Clone)]
pub struct ModelManager {
    client: Arc<dyn InferenceClient>,
    catalog: CatalogConfig,
}

impl ModelManager {
    pub fn new(client: Arc<dyn InferenceClient>, catalog: CatalogConfig) -> Self {
        Self { client, catalog }
    }

    /// List installed models
    pub async fn entries(&self) -> Result<Vec<ModelEntry>> {
        self.client.list().await
    }

    /// Fetch and partition the catalog
    pub async fn load_catalog(&self, events: &EventSink) -> Result<ModelCatalog> {
        match self.client.list().await {
            Ok(entries) => {
                let catalog = ModelCatalog::from_entries(&entries, &self.catalog.remote_marker);
                events.info(format!(
                    "Loaded {} models ({} local)",
                    catalog.all.len(),
                    catalog.local.len()
                ));
                Ok(catalog)
            }
            Err(e) => {
                events.error(format!("Could not load model list: {}", e));
                Err(e)
            }
        }
    }

    /// Probe the server and log the outcome
    pub async fn check_health(&self, events: &EventSink) -> HealthInfo {
        let info = check_health(self.client.as_ref()).await;
        if info.is_healthy() {
            match &info.version {
                Some(version) => events.success(format!("API connection OK (Ollama {})", version)),
                None => events.success("API connection OK"),
            }
        } else {
            events.error(format!("API connection FAILED ({})", info.status));
        }
        info
    }

    /// List resident models, one log line each
    pub async fn active_models(&self, events: &EventSink) -> Result<Vec<RunningModel>> {
        let running = match self.client.ps().await {
            Ok(running) => running,
            Err(e) => {
                events.error(format!("PS error: {}", e));
                return Err(e);
            }
        };

        if running.is_empty() {
            events.info("No model resident in VRAM");
        }
        for model in &running {
            let expires = model
                .expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| bench_core::types::UNAVAILABLE.to_string());
            events.info(format!(
                "Active: {} | VRAM: {:.2} GB | Expires: {}",
                model.id(),
                model.vram_gib(),
                expires
            ));
        }
        Ok(running)
    }

    /// Evict a model from memory immediately
    pub async fn unload(&self, model: &str, events: &EventSink) -> Result<()> {
        events.info(format!("Sending unload request for {}...", model));
        match self.client.generate(&GenerateRequest::unload(model)).await {
            Ok(_) => {
                events.success(format!("Model {} removed from memory", model));
                Ok(())
            }
            Err(e) => {
                events.error(format!("Unload failed: {}", e));
                Err(e)
            }
        }
    }

    /// Download a model, forwarding progress, then refresh the catalog
    pub async fn pull(&self, model: &str, events: &EventSink) -> Result<ModelCatalog> {
        events.info(format!("Starting download: {}...", model));

        let (tx, mut rx) = mpsc::unbounded_channel::<PullProgress>();
        let forward = async {
            while let Some(record) = rx.recv().await {
                match record.percent() {
                    Some(percent) => {
                        events.send(BenchEvent::Progress {
                            percent: percent.clamp(0.0, 100.0) as u8,
                        });
                    }
                    None => debug!("Pull {}: {}", model, record.status()),
                }
                events.send(BenchEvent::PullProgress(record));
            }
        };

        let (result, ()) = tokio::join!(self.client.pull(model, tx), forward);

        match result {
            Ok(()) => {
                events.success(format!("Model {} installed", model));
                self.load_catalog(events).await
            }
            Err(e) => {
                events.error(format!("Download of {} failed: {}", model, e));
                Err(e)
            }
        }
    }

    /// Remove a model, then refresh the catalog. Confirmation is the caller's job.
    pub async fn delete(&self, model: &str, events: &EventSink) -> Result<ModelCatalog> {
        match self.client.delete(model).await {
            Ok(()) => {
                events.success(format!("Model {} deleted", model));
                self.load_catalog(events).await
            }
            Err(e) => {
                events.error(format!("Delete failed: {}", e));
                Err(e)
            }
        }
    }

    /// Terminate and relaunch the server, then refresh the catalog
    pub async fn restart(&self, service: &ServiceManager, events: &EventSink) -> Result<ModelCatalog> {
        events.info("Restarting Ollama service...");

        match service.stop().await {
            Ok(true) => debug!("Stop command succeeded"),
            Ok(false) => events.warn("Stop command reported no running server"),
            Err(e) => {
                let e: bench_core::Error = e.into();
                events.error(format!("Restart failed: {}", e));
                return Err(e);
            }
        }
        tokio::time::sleep(service.config().stop_grace()).await;

        let pid = match service.launch() {
            Ok(pid) => pid,
            Err(e) => {
                let e: bench_core::Error = e.into();
                events.error(format!("Restart failed: {}", e));
                return Err(e);
            }
        };
        debug!("Relaunched server as pid {}", pid);

        events.info(format!(
            "Waiting {} seconds for startup...",
            service.config().startup_delay().as_secs()
        ));
        tokio::time::sleep(service.config().startup_delay()).await;

        self.load_catalog(events).await
    }
}
