//! Records exchanged between the inference adapter, the telemetry probe,
//! the benchmark engine, and the interactive surface.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Placeholder rendered for any telemetry field that could not be read
pub const UNAVAILABLE: &str = "N/A";

/// How long the server keeps a model resident after a request
///
/// Integer values are seconds (`0` unloads immediately, negative keeps the
/// model resident indefinitely); anything else is a duration string such as
/// `"5m"` or `"1h"` that the server parses itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepAlive {
    Seconds(i64),
    Duration(String),
}

impl KeepAlive {
    /// Unload the model as soon as the request completes
    pub const UNLOAD: KeepAlive = KeepAlive::Seconds(0);

    /// Keep the model resident until the server stops
    pub const FOREVER: KeepAlive = KeepAlive::Seconds(-1);
}

impl FromStr for KeepAlive {
    type Err = Error;

    /// Parses `"15m"`, `"0"`, `"-1"`, and labelled choices such as
    /// `"0 (unload)"`, where only the first token counts.
    fn from_str(s: &str) -> Result<Self> {
        let token = s
            .split_whitespace()
            .next()
            .ok_or_else(|| Error::invalid_request("keep-alive must not be empty"))?;

        if let Ok(seconds) = token.parse::<i64>() {
            return Ok(KeepAlive::Seconds(seconds));
        }

        let digits = token.strip_prefix('-').unwrap_or(token);
        let starts_with_digit = digits.chars().next().is_some_and(|c| c.is_ascii_digit());
        let ends_with_unit = token.ends_with(['s', 'm', 'h']);
        let well_formed = digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || "nsuµmh".contains(c));

        if starts_with_digit && ends_with_unit && well_formed {
            Ok(KeepAlive::Duration(token.to_string()))
        } else {
            Err(Error::invalid_request(format!("invalid keep-alive: {}", s)))
        }
    }
}

impl fmt::Display for KeepAlive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepAlive::Seconds(seconds) => write!(f, "{}", seconds),
            KeepAlive::Duration(duration) => write!(f, "{}", duration),
        }
    }
}

impl Serialize for KeepAlive {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            KeepAlive::Seconds(seconds) => serializer.serialize_i64(*seconds),
            KeepAlive::Duration(duration) => serializer.serialize_str(duration),
        }
    }
}

impl<'de> Deserialize<'de> for KeepAlive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(seconds) => Ok(KeepAlive::Seconds(seconds)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A single non-streaming generate call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,

    /// Omitted for pure load/unload requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<KeepAlive>,
}

impl GenerateRequest {
    /// Create a prompt request with server defaults for everything else
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: Some(prompt.into()),
            options: None,
            keep_alive: None,
        }
    }

    /// A prompt-less request that only changes how long the model stays resident
    pub fn unload(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: None,
            options: None,
            keep_alive: Some(KeepAlive::UNLOAD),
        }
    }

    pub fn with_context_size(mut self, num_ctx: u32) -> Self {
        self.options.get_or_insert_with(GenerateOptions::default).num_ctx = Some(num_ctx);
        self
    }

    pub fn context_size(&self) -> Option<u32> {
        self.options.as_ref().and_then(|o| o.num_ctx)
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }
}

/// Model options sent alongside a generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateOptions {
    /// Context window in tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
}

/// Timing fields of a completed generate call
///
/// Every field is optional: servers omit them for load/unload requests and
/// older servers omit some of them entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub response: Option<String>,

    #[serde(default)]
    pub done: Option<bool>,

    /// Nanoseconds spent on the whole request
    #[serde(default)]
    pub total_duration: Option<i64>,

    /// Nanoseconds spent loading the model
    #[serde(default)]
    pub load_duration: Option<i64>,

    #[serde(default)]
    pub prompt_eval_count: Option<u64>,

    #[serde(default)]
    pub prompt_eval_duration: Option<i64>,

    /// Tokens generated
    #[serde(default)]
    pub eval_count: Option<u64>,

    /// Nanoseconds spent generating `eval_count` tokens
    #[serde(default)]
    pub eval_duration: Option<i64>,
}

impl GenerateResponse {
    /// Evaluated token count, absent treated as zero
    pub fn eval_count_or_zero(&self) -> u64 {
        self.eval_count.unwrap_or(0)
    }

    /// Evaluation duration in nanoseconds, absent treated as zero
    pub fn eval_duration_or_zero(&self) -> i64 {
        self.eval_duration.unwrap_or(0)
    }
}

/// An installed model as reported by the model listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,

    #[serde(default)]
    pub model: Option<String>,

    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub modified_at: Option<DateTime<FixedOffset>>,
}

impl ModelEntry {
    /// Identifier to pass back to the API
    pub fn id(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(&self.name)
    }

    /// Whether the identifier carries the remote-only marker (case-insensitive)
    pub fn is_remote(&self, marker: &str) -> bool {
        !marker.is_empty() && self.id().to_lowercase().contains(&marker.to_lowercase())
    }
}

/// A model currently resident on the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningModel {
    pub name: String,

    #[serde(default)]
    pub model: Option<String>,

    /// Total size in bytes
    #[serde(default)]
    pub size: u64,

    /// Bytes held in accelerator memory
    #[serde(default)]
    pub size_vram: u64,

    #[serde(default)]
    pub expires_at: Option<DateTime<FixedOffset>>,
}

impl RunningModel {
    pub fn id(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(&self.name)
    }

    /// VRAM footprint in GiB
    pub fn vram_gib(&self) -> f64 {
        self.size_vram as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// One record of a model download stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PullProgress {
    /// Byte transfer of one layer
    Transfer {
        status: String,
        completed: u64,
        total: u64,
    },
    /// Phase message such as "pulling manifest" or "success"
    Phase { status: String },
}

impl PullProgress {
    /// Completion percentage for transfer records
    pub fn percent(&self) -> Option<f64> {
        match self {
            PullProgress::Transfer { completed, total, .. } if *total > 0 => {
                Some(*completed as f64 / *total as f64 * 100.0)
            }
            PullProgress::Transfer { .. } => Some(0.0),
            PullProgress::Phase { .. } => None,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            PullProgress::Transfer { status, .. } | PullProgress::Phase { status } => status,
        }
    }
}

/// Reading of the primary accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuReading {
    pub name: String,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub temperature_c: u32,
}

/// Why a telemetry read produced no reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailableReason {
    /// The telemetry tool is not installed
    ToolMissing,
    /// The tool ran and exited non-zero
    CommandFailed,
    /// The tool's output could not be parsed
    MalformedOutput,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::ToolMissing => write!(f, "tool-missing"),
            UnavailableReason::CommandFailed => write!(f, "command-failed"),
            UnavailableReason::MalformedOutput => write!(f, "malformed-output"),
        }
    }
}

/// Point-in-time hardware status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GpuSnapshot {
    Available(GpuReading),
    Unavailable { reason: UnavailableReason },
}

impl GpuSnapshot {
    pub fn unavailable(reason: UnavailableReason) -> Self {
        GpuSnapshot::Unavailable { reason }
    }

    pub fn reading(&self) -> Option<&GpuReading> {
        match self {
            GpuSnapshot::Available(reading) => Some(reading),
            GpuSnapshot::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.reading().is_some()
    }

    pub fn memory_used_mb(&self) -> Option<u64> {
        self.reading().map(|r| r.memory_used_mb)
    }

    pub fn temperature_c(&self) -> Option<u32> {
        self.reading().map(|r| r.temperature_c)
    }

    /// Temperature strictly above `threshold_c`
    pub fn is_hot(&self, threshold_c: u32) -> bool {
        self.temperature_c().is_some_and(|t| t > threshold_c)
    }

    /// One-line status for the interactive surface
    pub fn display_line(&self) -> String {
        match self {
            GpuSnapshot::Available(r) => format!(
                "{} | {}°C | VRAM: {}/{} MB",
                r.name, r.temperature_c, r.memory_used_mb, r.memory_total_mb
            ),
            GpuSnapshot::Unavailable { .. } => "GPU: unavailable".to_string(),
        }
    }
}

/// Outcome of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Ok,
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleStatus::Ok => write!(f, "OK"),
        }
    }
}

/// One row of a throughput sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub model: String,
    pub context_size: u32,
    pub tokens_per_second: f64,
    pub vram_used_mb: Option<u64>,
    pub temperature_c: Option<u32>,
    pub status: SampleStatus,
}

impl SampleRecord {
    pub fn vram_display(&self) -> String {
        self.vram_used_mb
            .map(|mb| format!("{} MB", mb))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }

    pub fn temperature_display(&self) -> String {
        self.temperature_c
            .map(|t| format!("{}°C", t))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }
}

/// Which side of a comparison was faster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
}

/// One row of a two-model comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub context_size: u32,
    pub model_a: String,
    pub model_b: String,
    pub tps_a: f64,
    pub tps_b: f64,
    /// `(tps_a - tps_b) / tps_b * 100`, zero when `tps_b` is zero
    pub diff_percent: f64,
    pub winner: Winner,
}

impl ComparisonRow {
    pub fn winner_name(&self) -> &str {
        match self.winner {
            Winner::A => &self.model_a,
            Winner::B => &self.model_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_alive_parsing() {
        assert_eq!("15m".parse::<KeepAlive>().unwrap(), KeepAlive::Duration("15m".into()));
        assert_eq!("1h".parse::<KeepAlive>().unwrap(), KeepAlive::Duration("1h".into()));
        assert_eq!("0".parse::<KeepAlive>().unwrap(), KeepAlive::UNLOAD);
        assert_eq!("-1".parse::<KeepAlive>().unwrap(), KeepAlive::FOREVER);
        assert_eq!("0 (unload now)".parse::<KeepAlive>().unwrap(), KeepAlive::UNLOAD);
        assert_eq!("-1 (forever)".parse::<KeepAlive>().unwrap(), KeepAlive::FOREVER);

        assert!("".parse::<KeepAlive>().is_err());
        assert!("soon".parse::<KeepAlive>().is_err());
        assert!("m15".parse::<KeepAlive>().is_err());
    }

    #[test]
    fn test_keep_alive_wire_format() {
        assert_eq!(serde_json::to_string(&KeepAlive::UNLOAD).unwrap(), "0");
        assert_eq!(serde_json::to_string(&KeepAlive::FOREVER).unwrap(), "-1");
        assert_eq!(
            serde_json::to_string(&KeepAlive::Duration("5m".into())).unwrap(),
            "\"5m\""
        );

        let parsed: KeepAlive = serde_json::from_str("\"30m\"").unwrap();
        assert_eq!(parsed, KeepAlive::Duration("30m".into()));
        let parsed: KeepAlive = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, KeepAlive::FOREVER);
    }

    #[test]
    fn test_generate_request_body() {
        let request = GenerateRequest::new("llama3.2:3b", "Say Hello")
            .with_context_size(8192)
            .with_keep_alive(KeepAlive::Duration("15m".into()));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "llama3.2:3b");
        assert_eq!(body["options"]["num_ctx"], 8192);
        assert_eq!(body["keep_alive"], "15m");

        let unload = serde_json::to_value(GenerateRequest::unload("phi3:latest")).unwrap();
        assert!(unload.get("prompt").is_none());
        assert!(unload.get("options").is_none());
        assert_eq!(unload["keep_alive"], 0);
    }

    #[test]
    fn test_generate_response_missing_fields() {
        let response: GenerateResponse = serde_json::from_str(r#"{"model":"m","done":true}"#).unwrap();
        assert_eq!(response.eval_count_or_zero(), 0);
        assert_eq!(response.eval_duration_or_zero(), 0);

        let response: GenerateResponse =
            serde_json::from_str(r#"{"eval_count":100,"eval_duration":2000000000}"#).unwrap();
        assert_eq!(response.eval_count_or_zero(), 100);
        assert_eq!(response.eval_duration_or_zero(), 2_000_000_000);
    }

    #[test]
    fn test_model_entry_remote_marker() {
        let local: ModelEntry =
            serde_json::from_str(r#"{"name":"llama3.2:3b","model":"llama3.2:3b","size":2019393189}"#)
                .unwrap();
        let remote: ModelEntry =
            serde_json::from_str(r#"{"name":"gpt-oss:120b-CLOUD","size":384}"#).unwrap();

        assert!(!local.is_remote(":cloud"));
        assert!(remote.is_remote(":cloud"));
        assert_eq!(remote.id(), "gpt-oss:120b-CLOUD");
        assert!(!remote.is_remote(""));
    }

    #[test]
    fn test_running_model_vram() {
        let running: RunningModel = serde_json::from_str(
            r#"{"name":"mistral:latest","size_vram":3221225472,"expires_at":"2026-10-19T14:38:31.83753-07:00"}"#,
        )
        .unwrap();
        assert!((running.vram_gib() - 3.0).abs() < f64::EPSILON);
        assert!(running.expires_at.is_some());
    }

    #[test]
    fn test_pull_progress_percent() {
        let transfer = PullProgress::Transfer {
            status: "pulling 6a0746a1ec1a".into(),
            completed: 25,
            total: 100,
        };
        assert_eq!(transfer.percent(), Some(25.0));

        let empty = PullProgress::Transfer { status: "x".into(), completed: 0, total: 0 };
        assert_eq!(empty.percent(), Some(0.0));

        let phase = PullProgress::Phase { status: "pulling manifest".into() };
        assert_eq!(phase.percent(), None);
        assert_eq!(phase.status(), "pulling manifest");
    }

    #[test]
    fn test_gpu_snapshot_rendering() {
        let snapshot = GpuSnapshot::Available(GpuReading {
            name: "NVIDIA GeForce GTX 1070 Ti".into(),
            memory_used_mb: 5120,
            memory_total_mb: 8192,
            temperature_c: 78,
        });
        assert_eq!(
            snapshot.display_line(),
            "NVIDIA GeForce GTX 1070 Ti | 78°C | VRAM: 5120/8192 MB"
        );
        assert!(snapshot.is_hot(75));
        assert!(!snapshot.is_hot(78));

        let missing = GpuSnapshot::unavailable(UnavailableReason::ToolMissing);
        assert_eq!(missing.display_line(), "GPU: unavailable");
        assert_eq!(missing.memory_used_mb(), None);
        assert_eq!(missing.temperature_c(), None);
        assert!(!missing.is_hot(0));
    }

    #[test]
    fn test_sample_record_placeholders() {
        let record = SampleRecord {
            model: "m".into(),
            context_size: 4096,
            tokens_per_second: 50.0,
            vram_used_mb: None,
            temperature_c: None,
            status: SampleStatus::Ok,
        };
        assert_eq!(record.vram_display(), "N/A");
        assert_eq!(record.temperature_display(), "N/A");
        assert_eq!(record.status.to_string(), "OK");
    }

    #[test]
    fn test_comparison_winner_name() {
        let row = ComparisonRow {
            context_size: 8192,
            model_a: "a".into(),
            model_b: "b".into(),
            tps_a: 60.0,
            tps_b: 50.0,
            diff_percent: 20.0,
            winner: Winner::A,
        };
        assert_eq!(row.winner_name(), "a");
    }
}
