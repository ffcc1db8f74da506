//! Core traits for ollabench components
//!
//! These traits define the interfaces to the inference server and to the
//! hardware telemetry source. The engine only ever talks to these seams, so
//! tests can drive it with in-memory implementations.

use crate::{
    GenerateRequest, GenerateResponse, GpuSnapshot, ModelEntry, PullProgress, Result,
    RunningModel,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for talking to an inference server
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one non-streaming generate call
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse>;

    /// List installed models
    async fn list(&self) -> Result<Vec<ModelEntry>>;

    /// List models currently resident in memory
    async fn ps(&self) -> Result<Vec<RunningModel>>;

    /// Download a model, sending each progress record to `progress`
    async fn pull(&self, model: &str, progress: mpsc::UnboundedSender<PullProgress>) -> Result<()>;

    /// Remove an installed model
    async fn delete(&self, model: &str) -> Result<()>;

    /// Server version string
    async fn version(&self) -> Result<String>;
}

/// Trait for reading hardware telemetry
///
/// A failed read is not an error: implementations return
/// [`GpuSnapshot::Unavailable`] instead.
#[async_trait]
pub trait GpuTelemetry: Send + Sync {
    /// Take one snapshot of the primary accelerator
    async fn snapshot(&self) -> GpuSnapshot;
}
