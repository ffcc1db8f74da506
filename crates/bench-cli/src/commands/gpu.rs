//! GPU status command

use crate::client::StudioClient;
use crate::console::log_line;
use crate::output::{colorize_snapshot, OutputFormat, OutputFormatter};
use anyhow::Result;
use bench_adapter_gpu::GpuWatcher;
use bench_core::GpuSnapshot;
use chrono::Local;
use std::future::Future;
use tracing::debug;

/// Print one snapshot, or keep polling until interrupted.
///
/// `count` stops watching after that many snapshots.
pub async fn show(
    client: &StudioClient,
    watch: bool,
    count: Option<usize>,
    output_format: OutputFormat,
) -> Result<()> {
    let formatter = OutputFormatter::new(output_format);

    if !watch {
        let snapshot = client.telemetry().snapshot().await;
        if let GpuSnapshot::Unavailable { reason } = &snapshot {
            debug!("GPU telemetry unavailable: {}", reason);
        }
        return match output_format {
            OutputFormat::Table => formatter.print_list(std::slice::from_ref(&snapshot)),
            _ => formatter.print_item(&snapshot),
        };
    }

    watch_until(client, count, output_format, tokio::signal::ctrl_c()).await
}

/// Print snapshots as they arrive until `count` is reached, the watcher
/// ends, or `shutdown` resolves
async fn watch_until<F: Future>(
    client: &StudioClient,
    count: Option<usize>,
    output_format: OutputFormat,
    shutdown: F,
) -> Result<()> {
    let threshold = client.studio().telemetry.hot_threshold_c;
    let interval = client.studio().telemetry.poll_interval();
    let (task, mut snapshots) = GpuWatcher::new(client.telemetry(), interval).spawn();
    let mut seen = 0usize;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            snapshot = snapshots.recv() => {
                let Some(snapshot) = snapshot else { break };
                print_snapshot(&snapshot, threshold, output_format)?;
                seen += 1;
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = &mut shutdown => {
                debug!("Interrupted, stopping GPU watch");
                break;
            }
        }
    }

    task.abort();
    Ok(())
}

fn print_snapshot(snapshot: &GpuSnapshot, threshold: u32, output_format: OutputFormat) -> Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(snapshot)?),
        OutputFormat::Yaml => println!("---\n{}", serde_yaml::to_string(snapshot)?),
        OutputFormat::Text => println!("{}", log_line(Local::now(), &snapshot.display_line())),
        OutputFormat::Table => {
            let line = colorize_snapshot(snapshot, threshold);
            println!("{}", log_line(Local::now(), &line.to_string()));
        }
    }
    Ok(())
}
