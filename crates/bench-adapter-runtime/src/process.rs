//! Service lifecycle for the local inference server

use crate::{Result, RuntimeError};
use bench_core::ServiceConfig;
use std::process::Stdio;
use tracing::{debug, info, warn};

/// Windows `CREATE_NO_WINDOW` process creation flag
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Terminates and relaunches the inference server
pub struct ServiceManager {
    config: ServiceConfig,
}

impl ServiceManager {
    /// Create a new service manager
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Get the service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the stop command.
    ///
    /// Returns whether it exited successfully. A non-zero exit usually means
    /// no server was running and is not an error.
    pub async fn stop(&self) -> Result<bool> {
        let (program, args) = split_command(&self.config.stop_command, "stop")?;

        info!("Stopping inference server: {} {:?}", program, args);

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RuntimeError::Process(format!("Failed to run stop command '{}': {}", program, e)))?;

        if output.status.success() {
            debug!("Stop command exited successfully");
            Ok(true)
        } else {
            warn!(
                "Stop command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(false)
        }
    }

    /// Launch the server without a console window.
    ///
    /// The server outlives this call. A background task waits on it so an
    /// exited server is reaped, which requires a Tokio runtime.
    pub fn launch(&self) -> Result<u32> {
        let (program, args) = split_command(&self.config.serve_command, "serve")?;

        info!("Launching inference server: {} {:?}", program, args);

        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command
            .spawn()
            .map_err(|e| RuntimeError::Process(format!("Failed to spawn '{}': {}", program, e)))?;
        let pid = child
            .id()
            .ok_or_else(|| RuntimeError::Process(format!("'{}' exited immediately", program)))?;

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Inference server pid {} exited with {}", pid, status),
                Err(e) => warn!("Failed to wait on inference server pid {}: {}", pid, e),
            }
        });

        info!("Inference server launched with pid {}", pid);
        Ok(pid)
    }
}

fn split_command<'a>(command: &'a [String], role: &str) -> Result<(&'a str, &'a [String])> {
    match command.split_first() {
        Some((program, args)) if !program.trim().is_empty() => Ok((program.as_str(), args)),
        _ => Err(RuntimeError::Configuration(format!("{} command is empty", role))),
    }
}
