//! Configuration management for ollabench
//!
//! Configuration is layered with the following precedence:
//! 1. Environment variables prefixed `OLLABENCH__` (highest)
//! 2. Configuration file (YAML or JSON)
//! 3. Defaults (lowest)

use crate::{Error, KeepAlive, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable prefix; nested keys use the same separator,
/// e.g. `OLLABENCH__SERVER__ENDPOINT`.
pub const ENV_PREFIX: &str = "OLLABENCH";

/// Keys whose environment values are comma-separated lists,
/// e.g. `OLLABENCH__STRESS__CONTEXTS=2048,4096`.
///
/// `telemetry.args` is absent since its values contain commas; set it
/// in the config file.
const ENV_LIST_KEYS: &[&str] = &[
    "stress.contexts",
    "compare.contexts",
    "service.stop_command",
    "service.serve_command",
];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Inference server connection
    pub server: ServerConfig,

    /// Throughput sweep settings
    pub stress: StressConfig,

    /// Two-model comparison settings
    pub compare: CompareConfig,

    /// Hardware telemetry settings
    pub telemetry: TelemetryConfig,

    /// Inference service lifecycle commands
    pub service: ServiceConfig,

    /// Model catalog settings
    pub catalog: CatalogConfig,
}

impl StudioConfig {
    /// Load defaults, then `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let environment = ENV_LIST_KEYS.iter().fold(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .try_parsing(true),
            |env, key| env.with_list_parse_key(key),
        );
        builder = builder.add_source(environment);

        let parsed: Self = builder.build()?.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Render as YAML, e.g. to seed a config file
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.stress.validate()?;
        self.compare.validate()?;
        self.telemetry.validate()?;
        self.service.validate()?;
        Ok(())
    }
}

/// Inference server connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the server API
    pub endpoint: Url,

    /// Per-request timeout; unset means wait forever
    pub request_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Replace the endpoint with a parsed and validated URL
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        let candidate = Self {
            endpoint,
            ..self.clone()
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.scheme() != "http" && self.endpoint.scheme() != "https" {
            return Err(Error::config("server endpoint must use HTTP or HTTPS scheme"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(Error::config("request timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse("http://127.0.0.1:11434").expect("static URL is valid"),
            request_timeout_secs: None,
        }
    }
}

/// Throughput sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Context window sizes, run in order
    pub contexts: Vec<u32>,

    /// Prompt sent at every size
    pub prompt: String,

    /// Keep-alive sent with every request (`"15m"`, `"0"`, `"-1"`, ...)
    pub keep_alive: String,
}

impl StressConfig {
    pub fn keep_alive(&self) -> Result<KeepAlive> {
        self.keep_alive.parse()
    }

    fn validate(&self) -> Result<()> {
        validate_contexts("stress", &self.contexts)?;
        if self.prompt.trim().is_empty() {
            return Err(Error::config("stress prompt must not be empty"));
        }
        self.keep_alive()
            .map_err(|e| Error::config(format!("stress keep-alive: {}", e)))?;
        Ok(())
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            contexts: vec![4096, 8192, 16384, 32768],
            prompt: "Explain the theory of relativity in 100 words.".to_string(),
            keep_alive: "15m".to_string(),
        }
    }
}

/// Two-model comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub contexts: Vec<u32>,
    pub prompt: String,
}

impl CompareConfig {
    fn validate(&self) -> Result<()> {
        validate_contexts("compare", &self.contexts)?;
        if self.prompt.trim().is_empty() {
            return Err(Error::config("compare prompt must not be empty"));
        }
        Ok(())
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            contexts: vec![8192, 16384],
            prompt: "Say Hello".to_string(),
        }
    }
}

/// Hardware telemetry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Telemetry tool executable
    pub command: String,

    /// Arguments producing one `name, used, total, temperature` CSV line per GPU
    pub args: Vec<String>,

    /// Refresh interval of the live status
    pub poll_interval_ms: u64,

    /// Temperatures strictly above this are flagged hot
    pub hot_threshold_c: u32,
}

impl TelemetryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::config("telemetry command must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("telemetry poll interval must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            command: "nvidia-smi".to_string(),
            args: vec![
                "--query-gpu=gpu_name,memory.used,memory.total,temperature.gpu".to_string(),
                "--format=csv,noheader,nounits".to_string(),
            ],
            poll_interval_ms: 2000,
            hot_threshold_c: 75,
        }
    }
}

/// Inference service lifecycle commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Program and arguments that terminate the running server
    pub stop_command: Vec<String>,

    /// Program and arguments that launch the server
    pub serve_command: Vec<String>,

    /// Pause between terminating and relaunching
    pub stop_grace_ms: u64,

    /// Fixed wait after relaunching before the catalog is refreshed
    pub startup_delay_ms: u64,
}

impl ServiceConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.stop_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(Error::config("service stop command must not be empty"));
        }
        if self.serve_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(Error::config("service serve command must not be empty"));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let stop_command = if cfg!(windows) {
            vec!["taskkill", "/f", "/im", "ollama.exe"]
        } else {
            vec!["pkill", "-x", "ollama"]
        };

        Self {
            stop_command: stop_command.into_iter().map(String::from).collect(),
            serve_command: vec!["ollama".to_string(), "serve".to_string()],
            stop_grace_ms: 2000,
            startup_delay_ms: 5000,
        }
    }
}

/// Model catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Substring marking remote-only models, matched case-insensitively
    pub remote_marker: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            remote_marker: ":cloud".to_string(),
        }
    }
}

fn validate_contexts(section: &str, contexts: &[u32]) -> Result<()> {
    if contexts.is_empty() {
        return Err(Error::config(format!("{} contexts must not be empty", section)));
    }
    if contexts.contains(&0) {
        return Err(Error::config(format!("{} contexts must be greater than zero", section)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // `load` reads the process environment, which tests share
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = StudioConfig::default();
        assert_eq!(config.server.endpoint.as_str(), "http://127.0.0.1:11434/");
        assert_eq!(config.server.request_timeout(), None);
        assert_eq!(config.stress.contexts, vec![4096, 8192, 16384, 32768]);
        assert_eq!(config.stress.keep_alive().unwrap(), KeepAlive::Duration("15m".into()));
        assert_eq!(config.compare.contexts, vec![8192, 16384]);
        assert_eq!(config.compare.prompt, "Say Hello");
        assert_eq!(config.telemetry.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.telemetry.hot_threshold_c, 75);
        assert_eq!(config.service.startup_delay(), Duration::from_secs(5));
        assert_eq!(config.catalog.remote_marker, ":cloud");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = StudioConfig::default();
        config.server.endpoint = Url::parse("ftp://127.0.0.1:11434").unwrap();
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.stress.contexts.clear();
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.compare.contexts = vec![8192, 0];
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.stress.keep_alive = "whenever".to_string();
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.telemetry.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = StudioConfig::default();
        config.service.serve_command.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_endpoint() {
        let mut server = ServerConfig::default();
        server.set_endpoint("https://gpu-box:8443").unwrap();
        assert_eq!(server.endpoint.as_str(), "https://gpu-box:8443/");

        assert!(server.set_endpoint("gpu-box").is_err());
        assert!(server.set_endpoint("ftp://gpu-box").is_err());
        // Rejected values leave the previous endpoint in place
        assert_eq!(server.endpoint.host_str(), Some("gpu-box"));
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ollabench.yaml");
        std::fs::write(
            &path,
            "server:\n  endpoint: http://gpu-box:11434\nstress:\n  contexts: [2048, 4096]\n  keep_alive: \"-1\"\n",
        )
        .unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = StudioConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.endpoint.host_str(), Some("gpu-box"));
        assert_eq!(config.stress.contexts, vec![2048, 4096]);
        assert_eq!(config.stress.keep_alive().unwrap(), KeepAlive::FOREVER);
        // Untouched sections keep their defaults
        assert_eq!(config.compare.prompt, "Say Hello");
    }

    #[test]
    fn test_yaml_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seed.yaml");
        std::fs::write(&path, StudioConfig::default().to_yaml().unwrap()).unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let loaded = StudioConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, StudioConfig::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        std::fs::write(&path, "compare:\n  contexts: []\n").unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        assert!(StudioConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_environment_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("OLLABENCH__COMPARE__PROMPT", "Count to three");
        let config = StudioConfig::load(None);
        std::env::remove_var("OLLABENCH__COMPARE__PROMPT");

        assert_eq!(config.unwrap().compare.prompt, "Count to three");
    }

    #[test]
    fn test_environment_list_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("OLLABENCH__STRESS__CONTEXTS", "2048,4096");
        std::env::set_var("OLLABENCH__COMPARE__CONTEXTS", "8192");
        std::env::set_var("OLLABENCH__SERVICE__SERVE_COMMAND", "systemctl,start,ollama");
        let config = StudioConfig::load(None);
        std::env::remove_var("OLLABENCH__STRESS__CONTEXTS");
        std::env::remove_var("OLLABENCH__COMPARE__CONTEXTS");
        std::env::remove_var("OLLABENCH__SERVICE__SERVE_COMMAND");

        let config = config.unwrap();
        assert_eq!(config.stress.contexts, vec![2048, 4096]);
        assert_eq!(config.compare.contexts, vec![8192]);
        assert_eq!(config.service.serve_command, vec!["systemctl", "start", "ollama"]);
    }

    #[test]
    fn test_environment_beats_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ollabench.yaml");
        std::fs::write(&path, "stress:\n  contexts: [1024]\n").unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("OLLABENCH__STRESS__CONTEXTS", "2048,4096");
        let config = StudioConfig::load(Some(&path));
        std::env::remove_var("OLLABENCH__STRESS__CONTEXTS");

        assert_eq!(config.unwrap().stress.contexts, vec![2048, 4096]);
    }
}
