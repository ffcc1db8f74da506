//! # bench-adapter-runtime
//!
//! Runtime adapter for the Ollama inference server.
//!
//! This crate provides:
//! - [`OllamaAdapter`], an HTTP implementation of [`bench_core::InferenceClient`]
//! - Server health checks built on top of any inference client
//! - [`ServiceManager`] for terminating and relaunching the server process
//! - An in-memory client for tests (`mock` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use bench_adapter_runtime::OllamaAdapter;
//! use bench_core::{GenerateRequest, InferenceClient, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = OllamaAdapter::new(ServerConfig::default())?;
//!
//!     let request = GenerateRequest::new("llama3.2:3b", "Say Hello").with_context_size(8192);
//!     let response = adapter.generate(&request).await?;
//!     println!("generated {} tokens", response.eval_count_or_zero());
//!
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod health;
pub mod ollama;
pub mod process;

// Mock implementation for testing
#[cfg(any(feature = "mock", test))]
pub mod mock;

// Re-export main types
pub use health::{check_health, CheckResult, CheckStatus, HealthInfo, HealthStatus};
pub use ollama::OllamaAdapter;
pub use process::ServiceManager;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<RuntimeError> for bench_core::Error {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::Configuration(msg) => bench_core::Error::InvalidConfiguration(msg),
            RuntimeError::Connection(msg) => bench_core::Error::Network(msg),
            RuntimeError::Http(e) => bench_core::Error::Network(e.to_string()),
            RuntimeError::Model(msg) => bench_core::Error::Server(msg),
            RuntimeError::ModelNotFound(msg) => bench_core::Error::NotFound(msg),
            RuntimeError::Process(msg) => bench_core::Error::ServiceControl(msg),
            RuntimeError::Serialization(e) => bench_core::Error::Json(e),
            RuntimeError::Io(e) => bench_core::Error::Io(e),
            RuntimeError::InvalidResponse(msg) => bench_core::Error::InvalidResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RuntimeError::ModelNotFound("phi3:latest".to_string());
        assert_eq!(error.to_string(), "Model not found: phi3:latest");

        let error = RuntimeError::Model("out of memory".to_string());
        assert_eq!(error.to_string(), "Model error: out of memory");
    }

    #[test]
    fn test_core_error_conversion() {
        let core: bench_core::Error = RuntimeError::Connection("refused".to_string()).into();
        assert_eq!(core.category(), "network");

        let core: bench_core::Error = RuntimeError::ModelNotFound("x".to_string()).into();
        assert_eq!(core.category(), "not_found");

        let core: bench_core::Error = RuntimeError::Process("x".to_string()).into();
        assert_eq!(core.category(), "service_control");
    }
}
