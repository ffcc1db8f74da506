//! # bench-engine
//!
//! The benchmarking engine behind `ollabench`.
//!
//! This crate provides:
//! - Throughput arithmetic (tokens per second, relative difference, winner)
//! - [`ThroughputSampler`], which sweeps one model across context sizes and
//!   pairs every sample with a hardware snapshot
//! - [`ModelComparison`], which runs two models head to head
//! - [`ModelManager`] for the catalog, unload, pull, delete, and restart
//! - Background workers that stream [`BenchEvent`]s to the caller
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bench_adapter_gpu::NvidiaSmiProbe;
//! use bench_adapter_runtime::OllamaAdapter;
//! use bench_core::{StudioConfig, TelemetryConfig};
//! use bench_engine::{worker, BenchEvent, SweepPlan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StudioConfig::default();
//!     let client = Arc::new(OllamaAdapter::new(config.server.clone())?);
//!     let telemetry = Arc::new(NvidiaSmiProbe::new(TelemetryConfig::default()));
//!
//!     let plan = SweepPlan::from_config("llama3.2:3b", &config.stress)?;
//!     let mut handle = worker::spawn_stress(client, telemetry, plan);
//!     while let Some(event) = handle.next_event().await {
//!         if let BenchEvent::Sample(record) = event {
//!             println!("{} ctx: {:.2} tok/s", record.context_size, record.tokens_per_second);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod events;
pub mod models;
pub mod sampler;
pub mod throughput;
pub mod worker;

pub use compare::{ComparePlan, ModelComparison};
pub use events::{BenchEvent, EventSink, LogLevel};
pub use models::{ModelCatalog, ModelManager};
pub use sampler::{SweepFailure, SweepPlan, SweepSummary, ThroughputSampler};
pub use throughput::{compare_throughput, tokens_per_second};
pub use worker::WorkerHandle;
