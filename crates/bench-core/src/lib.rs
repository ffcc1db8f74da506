//! # bench-core
//!
//! Core types, traits, and configuration shared by every ollabench crate.
//!
//! This crate provides:
//!
//! - Sample, comparison, and model listing records produced by a benchmark run
//! - Hardware telemetry snapshots, including the "unavailable" state
//! - The [`InferenceClient`] and [`GpuTelemetry`] seams the engine drives
//! - Layered configuration (defaults, file, environment)
//! - The unified error and result types

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{
    CatalogConfig, CompareConfig, ServerConfig, ServiceConfig, StressConfig, StudioConfig,
    TelemetryConfig,
};
pub use error::{Error, Result};
pub use traits::{GpuTelemetry, InferenceClient};
pub use types::{
    ComparisonRow, GenerateOptions, GenerateRequest, GenerateResponse, GpuReading, GpuSnapshot, KeepAlive,
    ModelEntry, PullProgress, RunningModel, SampleRecord, SampleStatus, UnavailableReason, Winner,
};
