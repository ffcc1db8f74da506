//! Configuration management commands

use crate::config::CliConfig;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ConfigCommands;
use anyhow::Result;

/// Handle config commands
pub fn handle_config_command(
    config: &CliConfig,
    action: ConfigCommands,
    output_format: OutputFormat,
) -> Result<()> {
    let formatter = OutputFormatter::new(output_format);

    match action {
        ConfigCommands::Show => match output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&config.studio)?);
            }
            OutputFormat::Yaml => {
                print!("{}", config.studio.to_yaml()?);
            }
            OutputFormat::Table | OutputFormat::Text => {
                match config.source().filter(|p| p.exists()) {
                    Some(source) => formatter.print_info(&format!("Loaded from {}", source.display()))?,
                    None => formatter.print_info("No config file found, showing defaults")?,
                }
                print!("{}", config.studio.to_yaml()?);
            }
        },
        ConfigCommands::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => match config.source() {
                    Some(source) => source.to_path_buf(),
                    None => CliConfig::default_config_path()?,
                },
            };
            CliConfig::init(&path, force)?;
            formatter.print_success(&format!("Wrote default configuration to {}", path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_and_show() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ollabench.yaml");
        let config = CliConfig::load(Some(&path)).unwrap();

        handle_config_command(
            &config,
            ConfigCommands::Init { path: None, force: false },
            OutputFormat::Json,
        )
        .unwrap();
        assert!(path.exists());

        let err = handle_config_command(
            &config,
            ConfigCommands::Init { path: None, force: false },
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let config = CliConfig::load(Some(&path)).unwrap();
        handle_config_command(&config, ConfigCommands::Show, OutputFormat::Text).unwrap();
        handle_config_command(&config, ConfigCommands::Show, OutputFormat::Json).unwrap();
    }
}
