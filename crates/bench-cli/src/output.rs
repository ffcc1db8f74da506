//! Output formatting for the ollabench CLI

use anyhow::Result;
use bench_adapter_runtime::{HealthInfo, HealthStatus};
use bench_core::{ComparisonRow, GpuSnapshot, ModelEntry, RunningModel, SampleRecord};
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact text format
    Text,
}

impl OutputFormat {
    /// Machine-readable formats keep stdout free of log lines
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format as a table row
    fn table_headers() -> Vec<String>;
    fn table_row(&self) -> Vec<String>;

    /// Format as key-value pairs for detailed view
    fn key_value_pairs(&self) -> Vec<(String, String)>;
}

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format and print a single item
    pub fn print_item<T>(&self, item: &T) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(item)?);
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(item)?);
            }
            OutputFormat::Table => {
                for (key, value) in item.key_value_pairs() {
                    println!("{}: {}", key.bold().cyan(), value);
                }
            }
            OutputFormat::Text => {
                for (key, value) in item.key_value_pairs() {
                    println!("{}: {}", key, value);
                }
            }
        }
        Ok(())
    }

    /// Format and print a list of items
    pub fn print_list<T>(&self, items: &[T]) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(items)?);
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(items)?);
            }
            OutputFormat::Table | OutputFormat::Text if items.is_empty() => {
                println!("{}", "No items found".dimmed());
            }
            OutputFormat::Table => {
                println!("{}", render_table(items));
            }
            OutputFormat::Text => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    for (key, value) in item.key_value_pairs() {
                        println!("{}: {}", key, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) -> Result<()> {
        self.print_status("success", message, "✓".green().bold(), message.green())
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) -> Result<()> {
        self.print_status("warning", message, "⚠".yellow().bold(), message.yellow())
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) -> Result<()> {
        self.print_status("info", message, "ℹ".blue().bold(), message.blue())
    }

    fn print_status(
        &self,
        status: &str,
        message: &str,
        glyph: ColoredString,
        styled: ColoredString,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let result = serde_json::json!({
                    "status": status,
                    "message": message
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Yaml => {
                println!("status: {}", status);
                println!("message: {}", message);
            }
            OutputFormat::Table | OutputFormat::Text => {
                if status == "warning" {
                    eprintln!("{} {}", glyph, styled);
                } else {
                    println!("{} {}", glyph, styled);
                }
            }
        }
        Ok(())
    }

    /// Print a progress message (only for interactive formats)
    pub fn print_progress(&self, message: &str) {
        if !self.format.is_structured() {
            eprint!("{} {}...\r", "⏳".yellow(), message);
        }
    }

    /// Clear progress message (only for interactive formats)
    pub fn clear_progress(&self) {
        if !self.format.is_structured() {
            eprint!("\r{}\r", " ".repeat(80));
        }
    }
}

fn render_table<T: Formattable>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = T::table_headers()
        .iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for item in items {
        table.add_row(item.table_row());
    }
    table
}

/// Helper function to format bytes
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Tokens per second with two decimals
pub fn format_tps(tps: f64) -> String {
    format!("{:.2}", tps)
}

/// Signed percentage with one decimal
pub fn format_diff(diff_percent: f64) -> String {
    format!("{:+.1}%", diff_percent)
}

/// GPU status line, red when hot
pub fn colorize_snapshot(snapshot: &GpuSnapshot, hot_threshold_c: u32) -> ColoredString {
    let line = snapshot.display_line();
    if !snapshot.is_available() {
        line.dimmed()
    } else if snapshot.is_hot(hot_threshold_c) {
        line.red().bold()
    } else {
        line.green()
    }
}

impl Formattable for SampleRecord {
    fn table_headers() -> Vec<String> {
        ["Context", "Tokens/s", "VRAM", "Temp", "Status"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.context_size.to_string(),
            format_tps(self.tokens_per_second),
            self.vram_display(),
            self.temperature_display(),
            self.status.to_string(),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Model".to_string(), self.model.clone()),
            ("Context".to_string(), self.context_size.to_string()),
            ("Tokens/s".to_string(), format_tps(self.tokens_per_second)),
            ("VRAM".to_string(), self.vram_display()),
            ("Temperature".to_string(), self.temperature_display()),
            ("Status".to_string(), self.status.to_string()),
        ]
    }
}

impl Formattable for ComparisonRow {
    fn table_headers() -> Vec<String> {
        ["Context", "Model A (t/s)", "Model B (t/s)", "Diff", "Winner"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.context_size.to_string(),
            format_tps(self.tps_a),
            format_tps(self.tps_b),
            format_diff(self.diff_percent),
            self.winner_name().to_string(),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Context".to_string(), self.context_size.to_string()),
            (self.model_a.clone(), format_tps(self.tps_a)),
            (self.model_b.clone(), format_tps(self.tps_b)),
            ("Diff".to_string(), format_diff(self.diff_percent)),
            ("Winner".to_string(), self.winner_name().to_string()),
        ]
    }
}

/// One installed model, tagged local or remote
#[derive(Debug, Clone, Serialize)]
pub struct ModelRow {
    pub name: String,
    pub size: u64,
    pub modified_at: Option<String>,
    pub remote: bool,
}

impl ModelRow {
    pub fn new(entry: &ModelEntry, remote_marker: &str) -> Self {
        Self {
            name: entry.id().to_string(),
            size: entry.size,
            modified_at: entry.modified_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            remote: entry.is_remote(remote_marker),
        }
    }
}

impl Formattable for ModelRow {
    fn table_headers() -> Vec<String> {
        ["Name", "Size", "Modified", "Location"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format_bytes(self.size),
            self.modified_at.clone().unwrap_or_else(|| "-".to_string()),
            if self.remote { "remote" } else { "local" }.to_string(),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        Self::table_headers().into_iter().zip(self.table_row()).collect()
    }
}

impl Formattable for RunningModel {
    fn table_headers() -> Vec<String> {
        ["Name", "VRAM", "Expires"].iter().map(|s| s.to_string()).collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.id().to_string(),
            format!("{:.2} GB", self.vram_gib()),
            self.expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        Self::table_headers().into_iter().zip(self.table_row()).collect()
    }
}

impl Formattable for GpuSnapshot {
    fn table_headers() -> Vec<String> {
        ["GPU", "Temp", "VRAM Used", "VRAM Total"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        match self {
            GpuSnapshot::Available(r) => vec![
                r.name.clone(),
                format!("{}°C", r.temperature_c),
                format!("{} MB", r.memory_used_mb),
                format!("{} MB", r.memory_total_mb),
            ],
            GpuSnapshot::Unavailable { .. } => {
                let na = bench_core::types::UNAVAILABLE.to_string();
                vec![na.clone(), na.clone(), na.clone(), na]
            }
        }
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> =
            Self::table_headers().into_iter().zip(self.table_row()).collect();
        if let GpuSnapshot::Unavailable { reason } = self {
            pairs.push(("Reason".to_string(), reason.to_string()));
        }
        pairs
    }
}

impl Formattable for HealthInfo {
    fn table_headers() -> Vec<String> {
        ["Status", "Version", "Models", "Response Time"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        let status = match &self.status {
            HealthStatus::Healthy => "healthy".green().to_string(),
            HealthStatus::Unhealthy(_) => "unhealthy".red().to_string(),
        };
        vec![
            status,
            self.version.clone().unwrap_or_else(|| "-".to_string()),
            self.model_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{:.1} ms", self.response_time_ms),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> =
            Self::table_headers().into_iter().zip(self.table_row()).collect();
        for check in &self.checks {
            let value = match &check.message {
                Some(message) => format!("{} ({})", check.status, message),
                None => check.status.to_string(),
            };
            pairs.push((format!("Check {}", check.name), value));
        }
        pairs
    }
}
