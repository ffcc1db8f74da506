//! Health checking for the inference server

use bench_core::InferenceClient;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Health status of the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Server answered the catalog query
    Healthy,
    /// Server could not be reached or returned an error
    Unhealthy(String),
}

/// Detailed health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    /// Overall health status
    pub status: HealthStatus,

    /// Health check timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Response time in milliseconds
    pub response_time_ms: f64,

    /// Individual checks, in the order they ran
    pub checks: Vec<CheckResult>,

    /// Server version, when the server reported one
    pub version: Option<String>,

    /// Number of installed models, when the catalog query succeeded
    pub model_count: Option<usize>,
}

/// Individual check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name
    pub name: String,

    /// Check status
    pub status: CheckStatus,

    /// Check message
    pub message: Option<String>,

    /// Check duration in milliseconds
    pub duration_ms: f64,
}

/// Status of an individual check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

/// Probe the server.
///
/// The server counts as healthy when the model catalog can be listed. The
/// version query is informational and only downgrades to a warning.
pub async fn check_health(client: &dyn InferenceClient) -> HealthInfo {
    let started = Instant::now();

    let catalog_started = Instant::now();
    let mut info = match client.list().await {
        Ok(models) => {
            debug!("Health check: {} models listed", models.len());
            let mut info = HealthInfo::healthy().add_check(
                CheckResult::pass("catalog".to_string()).with_duration(elapsed_ms(catalog_started)),
            );
            info.model_count = Some(models.len());
            info
        }
        Err(e) => {
            warn!("Health check failed: {}", e);
            return HealthInfo::unhealthy(e.to_string())
                .add_check(
                    CheckResult::fail("catalog".to_string(), e.to_string())
                        .with_duration(elapsed_ms(catalog_started)),
                )
                .with_response_time(elapsed_ms(started));
        }
    };

    let version_started = Instant::now();
    match client.version().await {
        Ok(version) => {
            info.version = Some(version);
            info = info.add_check(
                CheckResult::pass("version".to_string()).with_duration(elapsed_ms(version_started)),
            );
        }
        Err(e) => {
            info = info.add_check(
                CheckResult::warn("version".to_string(), e.to_string())
                    .with_duration(elapsed_ms(version_started)),
            );
        }
    }

    info.with_response_time(elapsed_ms(started))
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

impl HealthInfo {
    /// Create a new health info with healthy status
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            timestamp: chrono::Utc::now(),
            response_time_ms: 0.0,
            checks: Vec::new(),
            version: None,
            model_count: None,
        }
    }

    /// Create a new health info with unhealthy status
    pub fn unhealthy(reason: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy(reason),
            ..Self::healthy()
        }
    }

    /// Add a check result
    pub fn add_check(mut self, check: CheckResult) -> Self {
        self.checks.push(check);
        self
    }

    /// Set response time
    pub fn with_response_time(mut self, response_time_ms: f64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: String) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            message: None,
            duration_ms: 0.0,
        }
    }

    /// Create a failing check result
    pub fn fail(name: String, message: String) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            message: Some(message),
            duration_ms: 0.0,
        }
    }

    /// Create a warning check result
    pub fn warn(name: String, message: String) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            message: Some(message),
            duration_ms: 0.0,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy(reason) => write!(f, "unhealthy: {}", reason),
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
            CheckStatus::Warn => write!(f, "warn"),
        }
    }
}
