//! ollabench - Benchmark and monitor a local Ollama server

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

mod client;
mod commands;
mod config;
mod console;
mod output;

use client::StudioClient;
use commands::bench::SweepOptions;
use config::CliConfig;
use output::OutputFormat;

/// Benchmark and monitor a local Ollama server
#[derive(Debug, Parser)]
#[command(name = "ollabench")]
#[command(about = "Benchmark and monitor a local Ollama server")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ollama API endpoint (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    endpoint: Option<String>,

    /// Output format (defaults to the config file setting)
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON output (overrides --output)
    #[arg(long)]
    json: bool,

    /// Timeout for API requests in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the Ollama API answers
    #[command(name = "health")]
    Health,

    /// Show models resident in memory
    #[command(name = "ps")]
    Ps,

    /// List installed models
    #[command(name = "models")]
    Models,

    /// Evict a model from memory immediately
    #[command(name = "unload")]
    Unload {
        /// Model identifier
        model: String,
    },

    /// Stop and relaunch the Ollama service
    #[command(name = "restart")]
    Restart,

    /// Measure tokens per second across context sizes
    #[command(name = "stress")]
    Stress {
        /// Model identifier (defaults to the first local model)
        model: Option<String>,

        /// Context sizes (comma-separated)
        #[arg(long, value_delimiter = ',')]
        contexts: Option<Vec<u32>>,

        /// Keep-alive sent with every request (e.g. 15m, 0, -1)
        #[arg(short, long, allow_hyphen_values = true)]
        keep_alive: Option<String>,

        /// Prompt sent at every context size
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Compare two models at each context size
    #[command(name = "compare")]
    Compare {
        /// Model A (defaults to the first local model)
        model_a: Option<String>,

        /// Model B (defaults to the second local model)
        model_b: Option<String>,

        /// Context sizes (comma-separated)
        #[arg(long, value_delimiter = ',')]
        contexts: Option<Vec<u32>>,

        /// Prompt sent to both models
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Download a model from the registry
    #[command(name = "pull")]
    Pull {
        /// Model identifier
        model: String,
    },

    /// Delete an installed model
    #[command(name = "delete")]
    Delete {
        /// Model identifier (defaults to the first installed model)
        model: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show GPU name, temperature and memory
    #[command(name = "gpu")]
    Gpu {
        /// Keep polling until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Stop watching after this many readings
        #[arg(short = 'n', long, requires = "watch")]
        count: Option<usize>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with every default
    Init {
        /// Destination (defaults to the config path in use)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

const WORKSPACE_TARGETS: &[&str] = &[
    "ollabench",
    "bench_core",
    "bench_engine",
    "bench_adapter_runtime",
    "bench_adapter_gpu",
];

fn log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// `--json` wins over `--output`, which wins over the config file
fn resolve_format(cli: &Cli, config: &CliConfig) -> OutputFormat {
    if cli.json {
        OutputFormat::Json
    } else {
        cli.output.unwrap_or(config.output_format)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to command output
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Starting ollabench with args: {:?}", cli);

    // Load configuration
    let mut config = CliConfig::load(cli.config.as_deref())?;
    debug!("Loaded configuration from {:?}", config.source());

    if let Some(endpoint) = &cli.endpoint {
        config.override_endpoint(endpoint)?;
    }
    if let Some(timeout) = cli.timeout {
        config.studio.server.request_timeout_secs = Some(timeout);
        config.studio.validate()?;
    }

    let output_format = resolve_format(&cli, &config);

    // Create client; nothing is sent until a command needs the server
    let client = StudioClient::new(config.studio.clone())?;

    match cli.command {
        Commands::Health => {
            commands::health::check(&client, output_format).await?;
        }

        Commands::Ps => {
            commands::models::show_active(&client, output_format).await?;
        }

        Commands::Models => {
            commands::models::list_models(&client, output_format).await?;
        }

        Commands::Unload { model } => {
            commands::models::unload(&client, &model, output_format).await?;
        }

        Commands::Restart => {
            commands::models::restart(&client, output_format).await?;
        }

        Commands::Stress { model, contexts, keep_alive, prompt } => {
            let options = SweepOptions { contexts, prompt, keep_alive };
            commands::bench::stress(&client, model, options, output_format).await?;
        }

        Commands::Compare { model_a, model_b, contexts, prompt } => {
            commands::bench::compare(&client, model_a, model_b, contexts, prompt, output_format).await?;
        }

        Commands::Pull { model } => {
            commands::models::pull(&client, model, output_format).await?;
        }

        Commands::Delete { model, yes } => {
            commands::models::delete(&client, model, yes, output_format).await?;
        }

        Commands::Gpu { watch, count } => {
            commands::gpu::show(&client, watch, count, output_format).await?;
        }

        Commands::Config { action } => {
            commands::config::handle_config_command(&config, action, output_format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["ollabench", "health"]).unwrap();
        assert!(matches!(cli.command, Commands::Health));

        let cli = Cli::try_parse_from([
            "ollabench", "stress", "llama3.2:3b", "--contexts", "2048,4096", "--keep-alive", "-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Stress { model, contexts, keep_alive, .. } => {
                assert_eq!(model.as_deref(), Some("llama3.2:3b"));
                assert_eq!(contexts, Some(vec![2048, 4096]));
                assert_eq!(keep_alive.as_deref(), Some("-1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["ollabench", "compare", "a", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Compare { .. }));

        let cli = Cli::try_parse_from(["ollabench", "delete", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { model: None, yes: true }));

        assert!(Cli::try_parse_from(["ollabench", "gpu", "--count", "3"]).is_err());
        assert!(Cli::try_parse_from(["ollabench", "unload"]).is_err());
    }

    #[test]
    fn test_output_format() {
        let config = CliConfig::default();

        let cli = Cli::try_parse_from(["ollabench", "--json", "--output", "yaml", "models"]).unwrap();
        assert_eq!(resolve_format(&cli, &config), OutputFormat::Json);

        let cli = Cli::try_parse_from(["ollabench", "--output", "yaml", "models"]).unwrap();
        assert_eq!(resolve_format(&cli, &config), OutputFormat::Yaml);

        let mut config = CliConfig::default();
        config.output_format = OutputFormat::Text;
        let cli = Cli::try_parse_from(["ollabench", "models"]).unwrap();
        assert_eq!(resolve_format(&cli, &config), OutputFormat::Text);
    }

    #[test]
    fn test_log_filter() {
        assert!(log_filter(false).starts_with("ollabench=warn,bench_core=warn"));
        assert!(log_filter(true).contains("bench_adapter_gpu=debug"));
    }
}
