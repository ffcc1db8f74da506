//! `nvidia-smi` telemetry backend

use crate::{GpuError, Result};
use bench_core::{GpuReading, GpuSnapshot, GpuTelemetry, TelemetryConfig};

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tracing::debug;

/// Windows `CREATE_NO_WINDOW` process creation flag
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Reads the primary GPU by running the configured query command
pub struct NvidiaSmiProbe {
    config: TelemetryConfig,
}

impl NvidiaSmiProbe {
    pub fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Run the query once and parse the first GPU
    pub async fn query(&self) -> Result<GpuReading> {
        let mut command = tokio::process::Command::new(&self.config.command);
        command.args(&self.config.args).stdin(Stdio::null());

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let output = command.output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => GpuError::ToolMissing(self.config.command.clone()),
            _ => GpuError::CommandFailed(format!("{}: {}", self.config.command, e)),
        })?;

        if !output.status.success() {
            return Err(GpuError::CommandFailed(format!(
                "{} exited with {}",
                self.config.command, output.status
            )));
        }

        parse_reading(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl GpuTelemetry for NvidiaSmiProbe {
    async fn snapshot(&self) -> GpuSnapshot {
        match self.query().await {
            Ok(reading) => GpuSnapshot::Available(reading),
            Err(e) => {
                debug!("GPU telemetry unavailable: {}", e);
                GpuSnapshot::unavailable(e.reason())
            }
        }
    }
}

/// Parse `name, used MiB, total MiB, temperature` from the first non-empty line.
///
/// Later lines describe additional GPUs and are ignored.
pub fn parse_reading(stdout: &str) -> Result<GpuReading> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| GpuError::MalformedOutput("empty output".to_string()))?;

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, used, total, temperature] = fields.as_slice() else {
        return Err(GpuError::MalformedOutput(format!(
            "expected 4 fields, got {}: {}",
            fields.len(),
            line
        )));
    };

    let number = |field: &str, what: &str| -> Result<u64> {
        field
            .parse::<u64>()
            .map_err(|_| GpuError::MalformedOutput(format!("{} is not a number: {}", what, field)))
    };

    let temperature_c = u32::try_from(number(*temperature, "temperature")?)
        .map_err(|_| GpuError::MalformedOutput(format!("temperature out of range: {}", temperature)))?;

    Ok(GpuReading {
        name: name.to_string(),
        memory_used_mb: number(*used, "memory used")?,
        memory_total_mb: number(*total, "memory total")?,
        temperature_c,
    })
}
