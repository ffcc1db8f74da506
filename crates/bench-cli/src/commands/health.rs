//! Server health command

use crate::client::StudioClient;
use crate::console::Console;
use crate::output::OutputFormat;
use anyhow::Result;
use bench_engine::EventSink;

/// Probe the server and print the result
pub async fn check(client: &StudioClient, output_format: OutputFormat) -> Result<()> {
    let mut console = Console::new(output_format);
    let (events, mut rx) = EventSink::channel();

    console.formatter().print_progress(&format!("Checking {}", client.endpoint()));
    let info = client.manager().check_health(&events).await;
    console.formatter().clear_progress();
    console.drain(&mut rx);

    console.formatter().print_item(&info)?;

    if !info.is_healthy() {
        anyhow::bail!("Ollama API is not reachable at {}", client.endpoint());
    }
    Ok(())
}
