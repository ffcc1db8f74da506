//! Command implementations for the ollabench CLI

pub mod bench;
pub mod config;
pub mod gpu;
pub mod health;
pub mod models;

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::StudioClient;
    use bench_adapter_gpu::mock::MockGpuTelemetry;
    use bench_adapter_runtime::mock::MockInferenceClient;
    use bench_core::StudioConfig;
    use std::sync::Arc;

    /// A client backed by the given mock server and a healthy mock GPU
    pub fn client(inference: MockInferenceClient) -> StudioClient {
        client_with(StudioConfig::default(), inference, MockGpuTelemetry::healthy())
    }

    pub fn client_with(
        studio: StudioConfig,
        inference: MockInferenceClient,
        telemetry: MockGpuTelemetry,
    ) -> StudioClient {
        StudioClient::with_backends(studio, Arc::new(inference), Arc::new(telemetry))
    }
}
