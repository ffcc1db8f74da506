//! Throughput sampler: one model swept across context window sizes

use crate::events::{BenchEvent, EventSink};
use crate::throughput::response_tps;
use bench_core::{
    GenerateRequest, GpuTelemetry, InferenceClient, KeepAlive, Result, SampleRecord, SampleStatus,
    StressConfig,
};

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What to sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub model: String,
    pub contexts: Vec<u32>,
    pub prompt: String,
    pub keep_alive: KeepAlive,
}

impl SweepPlan {
    /// Build a plan for `model` from the stress settings
    pub fn from_config(model: impl Into<String>, config: &StressConfig) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            contexts: config.contexts.clone(),
            prompt: config.prompt.clone(),
            keep_alive: config.keep_alive()?,
        })
    }

    fn request(&self, context_size: u32) -> GenerateRequest {
        GenerateRequest::new(self.model.clone(), self.prompt.clone())
            .with_context_size(context_size)
            .with_keep_alive(self.keep_alive.clone())
    }
}

/// The step that stopped a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFailure {
    pub context_size: u32,
    pub error: String,
}

/// Result of one sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub model: String,
    pub records: Vec<SampleRecord>,
    pub failure: Option<SweepFailure>,
}

impl SweepSummary {
    pub fn completed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Runs sweeps against an inference server, pairing every sample with a
/// hardware snapshot
pub struct ThroughputSampler {
    client: Arc<dyn InferenceClient>,
    telemetry: Arc<dyn GpuTelemetry>,
}

impl ThroughputSampler {
    pub fn new(client: Arc<dyn InferenceClient>, telemetry: Arc<dyn GpuTelemetry>) -> Self {
        Self { client, telemetry }
    }

    /// Run the sweep in order, stopping at the first failed request.
    ///
    /// Rows already emitted stand when a later size fails.
    pub async fn run(&self, plan: &SweepPlan, events: &EventSink) -> SweepSummary {
        let total = plan.contexts.len();
        let mut records = Vec::with_capacity(total);
        let mut failure = None;

        for (i, &context_size) in plan.contexts.iter().enumerate() {
            events.info(format!("Testing {} @ {} context...", plan.model, context_size));

            let response = match self.client.generate(&plan.request(context_size)).await {
                Ok(response) => response,
                Err(e) => {
                    events.error(format!("Error @ {} ctx: {}", context_size, e));
                    failure = Some(SweepFailure {
                        context_size,
                        error: e.to_string(),
                    });
                    break;
                }
            };

            let tokens_per_second = response_tps(&response);
            let snapshot = self.telemetry.snapshot().await;
            debug!(
                "Sample {} @ {}: {:.2} tok/s, gpu {:?}",
                plan.model, context_size, tokens_per_second, snapshot
            );

            let record = SampleRecord {
                model: plan.model.clone(),
                context_size,
                tokens_per_second,
                vram_used_mb: snapshot.memory_used_mb(),
                temperature_c: snapshot.temperature_c(),
                status: SampleStatus::Ok,
            };
            events.send(BenchEvent::Sample(record.clone()));
            records.push(record);

            events.progress(i + 1, total);
        }

        events.info(format!("Stress test for {} finished", plan.model));

        SweepSummary {
            model: plan.model.clone(),
            records,
            failure,
        }
    }
}
