//! Connections to the Ollama server and the GPU probe

use anyhow::{Context, Result};
use bench_adapter_gpu::NvidiaSmiProbe;
use bench_adapter_runtime::{OllamaAdapter, ServiceManager};
use bench_core::{GpuTelemetry, InferenceClient, StudioConfig};
use bench_engine::ModelManager;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs to talk to the outside world
#[derive(Clone)]
pub struct StudioClient {
    studio: StudioConfig,
    inference: Arc<dyn InferenceClient>,
    telemetry: Arc<dyn GpuTelemetry>,
}

impl StudioClient {
    /// Build the HTTP adapter and the nvidia-smi probe from configuration.
    ///
    /// No request is made here; an unreachable server surfaces on first use.
    pub fn new(studio: StudioConfig) -> Result<Self> {
        debug!("Using Ollama API at {}", studio.server.endpoint);

        let adapter = OllamaAdapter::new(studio.server.clone())
            .context("Failed to create Ollama client")?;
        let probe = NvidiaSmiProbe::new(studio.telemetry.clone());

        Ok(Self::with_backends(studio, Arc::new(adapter), Arc::new(probe)))
    }

    /// Use the given backends instead of the real ones
    pub fn with_backends(
        studio: StudioConfig,
        inference: Arc<dyn InferenceClient>,
        telemetry: Arc<dyn GpuTelemetry>,
    ) -> Self {
        Self {
            studio,
            inference,
            telemetry,
        }
    }

    pub fn studio(&self) -> &StudioConfig {
        &self.studio
    }

    pub fn inference(&self) -> Arc<dyn InferenceClient> {
        self.inference.clone()
    }

    pub fn telemetry(&self) -> Arc<dyn GpuTelemetry> {
        self.telemetry.clone()
    }

    pub fn endpoint(&self) -> &str {
        self.studio.server.endpoint.as_str()
    }

    pub fn manager(&self) -> ModelManager {
        ModelManager::new(self.inference(), self.studio.catalog.clone())
    }

    pub fn service(&self) -> ServiceManager {
        ServiceManager::new(self.studio.service.clone())
    }
}
