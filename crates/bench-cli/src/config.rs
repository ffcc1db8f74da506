//! Configuration management for the ollabench CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use bench_core::StudioConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration: the engine settings plus CLI-only preferences,
/// read from one file
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Engine settings (defaults, file, environment)
    pub studio: StudioConfig,

    /// Output format used when neither `--output` nor `--json` is given
    pub output_format: OutputFormat,

    /// Configuration source path
    source: Option<PathBuf>,
}

/// CLI-only keys stored next to the engine sections
#[derive(Debug, Default, Deserialize)]
struct CliPreferences {
    #[serde(default)]
    output_format: Option<String>,
}

/// Layout of a seeded configuration file
#[derive(Serialize)]
struct ConfigFile<'a> {
    output_format: &'a str,
    #[serde(flatten)]
    studio: &'a StudioConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            studio: StudioConfig::default(),
            output_format: OutputFormat::Table,
            source: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from `config_path`, or the default location.
    ///
    /// A missing file is not an error; defaults and environment overrides
    /// still apply.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let studio = StudioConfig::load(Some(&config_path))
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

        let output_format = if config_path.exists() {
            Self::read_output_format(&config_path)?
        } else {
            OutputFormat::Table
        };

        Ok(Self {
            studio,
            output_format,
            source: Some(config_path),
        })
    }

    fn read_output_format(path: &Path) -> Result<OutputFormat> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // YAML is a superset of JSON, so one parser covers both file types
        let prefs: CliPreferences = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        match prefs.output_format {
            Some(name) => OutputFormat::from_str(&name, true)
                .map_err(|e| anyhow::anyhow!("Invalid output_format '{}': {}", name, e)),
            None => Ok(OutputFormat::Table),
        }
    }

    /// Write a configuration file with every default spelled out
    pub fn init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let defaults = StudioConfig::default();
        let file = ConfigFile {
            output_format: "table",
            studio: &defaults,
        };
        let content = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::to_string_pretty(&file)?
        } else {
            serde_yaml::to_string(&file)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ollabench").join("config.yaml"))
    }

    /// Get the configuration source path
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Point the engine at a different server
    pub fn override_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.studio.server.set_endpoint(endpoint)?;
        Ok(())
    }
}
