//! Error handling for ollabench
//!
//! Provides a unified error type and result type for use across all ollabench components.

/// Result type alias for ollabench operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for ollabench
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// Could not reach the inference server
    #[error("Network error: {0}")]
    Network(String),

    /// Inference server is reachable but refused or failed the request
    #[error("Inference server error: {0}")]
    Server(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Inference service lifecycle errors
    #[error("Service control error: {0}")]
    ServiceControl(String),

    /// GPU telemetry errors
    #[error("GPU telemetry error: {0}")]
    GpuTelemetry(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration parsing errors
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a GPU telemetry error
    pub fn gpu_telemetry(msg: impl Into<String>) -> Self {
        Self::GpuTelemetry(msg.into())
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "configuration",
            Error::Network(_) => "network",
            Error::Server(_) => "server",
            Error::NotFound(_) => "not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::InvalidResponse(_) => "invalid_response",
            Error::ServiceControl(_) => "service_control",
            Error::GpuTelemetry(_) => "gpu_telemetry",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Config(_) => "config",
        }
    }
}
