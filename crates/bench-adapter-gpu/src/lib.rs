//! # bench-adapter-gpu
//!
//! GPU telemetry for benchmark samples and the live status line.
//!
//! This crate provides:
//! - [`NvidiaSmiProbe`], which shells out to `nvidia-smi` for one reading
//! - [`GpuWatcher`], which polls any [`bench_core::GpuTelemetry`] on an interval
//! - An in-memory telemetry source for tests (`mock` feature)
//!
//! A failed read never surfaces as an error to callers of
//! [`bench_core::GpuTelemetry::snapshot`]; it becomes an unavailable
//! snapshot tagged with the reason.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bench_adapter_gpu::NvidiaSmiProbe;
//! use bench_core::{GpuTelemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let probe = NvidiaSmiProbe::new(TelemetryConfig::default());
//!     println!("{}", probe.snapshot().await.display_line());
//! }
//! ```

use bench_core::UnavailableReason;
use thiserror::Error;

pub mod nvidia_smi;
pub mod watcher;

// Mock implementation for testing
#[cfg(any(feature = "mock", test))]
pub mod mock;

pub use nvidia_smi::{parse_reading, NvidiaSmiProbe};
pub use watcher::GpuWatcher;

/// Result type for GPU operations
pub type Result<T> = std::result::Result<T, GpuError>;

/// Errors that can occur while reading telemetry
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("Telemetry tool not found: {0}")]
    ToolMissing(String),

    #[error("Telemetry command failed: {0}")]
    CommandFailed(String),

    #[error("Malformed telemetry output: {0}")]
    MalformedOutput(String),
}

impl GpuError {
    /// Reason recorded on the resulting unavailable snapshot
    pub fn reason(&self) -> UnavailableReason {
        match self {
            GpuError::ToolMissing(_) => UnavailableReason::ToolMissing,
            GpuError::CommandFailed(_) => UnavailableReason::CommandFailed,
            GpuError::MalformedOutput(_) => UnavailableReason::MalformedOutput,
        }
    }
}

impl From<GpuError> for bench_core::Error {
    fn from(err: GpuError) -> Self {
        bench_core::Error::gpu_telemetry(err.to_string())
    }
}
