//! Model catalog and lifecycle commands

use crate::client::StudioClient;
use crate::console::Console;
use crate::output::{ModelRow, OutputFormat, OutputFormatter};
use anyhow::{Context, Result};
use bench_engine::{worker, EventSink, ModelCatalog};
use std::io::{BufRead, Write};

/// List installed models
pub async fn list_models(client: &StudioClient, output_format: OutputFormat) -> Result<()> {
    let entries = client
        .manager()
        .entries()
        .await
        .context("Failed to list models")?;

    let marker = &client.studio().catalog.remote_marker;
    let rows: Vec<ModelRow> = entries.iter().map(|e| ModelRow::new(e, marker)).collect();
    OutputFormatter::new(output_format).print_list(&rows)?;
    Ok(())
}

/// Show models resident in memory
pub async fn show_active(client: &StudioClient, output_format: OutputFormat) -> Result<()> {
    let mut console = Console::quiet(output_format);
    let (events, mut rx) = EventSink::channel();

    let running = client.manager().active_models(&events).await;
    console.drain(&mut rx);
    let running = running.context("Failed to query running models")?;

    console.formatter().print_list(&running)?;
    Ok(())
}

/// Evict a model from memory
pub async fn unload(client: &StudioClient, model: &str, output_format: OutputFormat) -> Result<()> {
    let mut console = Console::new(output_format);
    let (events, mut rx) = EventSink::channel();

    let result = client.manager().unload(model, &events).await;
    console.drain(&mut rx);
    result.with_context(|| format!("Failed to unload {}", model))?;

    if output_format.is_structured() {
        console.formatter().print_success(&format!("Model {} removed from memory", model))?;
    }
    Ok(())
}

/// Download a model with live progress
pub async fn pull(client: &StudioClient, model: String, output_format: OutputFormat) -> Result<()> {
    let mut console = Console::new(output_format);
    console.follow(worker::spawn_pull(client.manager(), model.clone())).await?;

    if console.errors() > 0 {
        anyhow::bail!("Download of {} failed", model);
    }
    if output_format.is_structured() {
        console.formatter().print_success(&format!("Model {} installed", model))?;
    }
    Ok(())
}

/// Delete a model after confirmation.
///
/// Without a name the first installed model is offered, matching the
/// default selection of the model picker.
pub async fn delete(
    client: &StudioClient,
    model: Option<String>,
    yes: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let model = match model {
        Some(model) => model,
        None => {
            let catalog = load_catalog_quietly(client, output_format).await?;
            catalog
                .default_delete_target()
                .map(str::to_string)
                .context("No models installed")?
        }
    };

    if !yes {
        let stdin = std::io::stdin();
        let confirmed = confirm(
            &format!("Permanently delete {}?", model),
            &mut stdin.lock(),
            &mut std::io::stderr(),
        )?;
        if !confirmed {
            OutputFormatter::new(output_format).print_warning("Deletion cancelled")?;
            return Ok(());
        }
    }

    let mut console = Console::new(output_format);
    let (events, mut rx) = EventSink::channel();
    let result = client.manager().delete(&model, &events).await;
    console.drain(&mut rx);
    result.with_context(|| format!("Failed to delete {}", model))?;

    if output_format.is_structured() {
        console.formatter().print_success(&format!("Model {} deleted", model))?;
    }
    Ok(())
}

/// Terminate and relaunch the server
pub async fn restart(client: &StudioClient, output_format: OutputFormat) -> Result<()> {
    let manager = client.manager();
    let service = client.service();

    let mut console = Console::new(output_format);
    console
        .follow(worker::spawn(move |events| async move {
            // Failures are already reported as log events
            let _ = manager.restart(&service, &events).await;
        }))
        .await?;

    if console.errors() > 0 {
        anyhow::bail!("Restart did not complete");
    }
    if output_format.is_structured() {
        console.formatter().print_success("Ollama service restarted")?;
    }
    Ok(())
}

/// Fetch the catalog, printing only problems
pub async fn load_catalog_quietly(
    client: &StudioClient,
    output_format: OutputFormat,
) -> Result<ModelCatalog> {
    let mut console = Console::quiet(output_format);
    let (events, mut rx) = EventSink::channel();
    let catalog = client.manager().load_catalog(&events).await;
    console.drain(&mut rx);
    catalog.context("Failed to load the model list")
}

/// Ask a yes/no question; anything but "y" or "yes" declines
pub fn confirm(question: &str, input: &mut impl BufRead, prompt: &mut impl Write) -> Result<bool> {
    write!(prompt, "{} [y/N] ", question)?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer).context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
