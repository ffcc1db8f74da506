//! Terminal rendering of engine events
//!
//! The main task is the only writer to the terminal. Workers report through
//! [`BenchEvent`]s; the console prints log lines with a local timestamp,
//! keeps a single progress line on stderr, and collects result rows so the
//! command can print them as a table (or JSON/YAML) once the worker is done.

use crate::output::{format_tps, OutputFormat, OutputFormatter};
use anyhow::{Context, Result};
use bench_core::{ComparisonRow, PullProgress, SampleRecord};
use bench_engine::{BenchEvent, LogLevel, WorkerHandle};
use chrono::{DateTime, Local};
use colored::*;
use tokio::sync::mpsc;

/// Event printer and result collector for one command
pub struct Console {
    formatter: OutputFormatter,
    quiet: bool,
    progress_shown: bool,
    samples: Vec<SampleRecord>,
    comparisons: Vec<ComparisonRow>,
    errors: usize,
}

impl Console {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            formatter: OutputFormatter::new(format),
            quiet: false,
            progress_shown: false,
            samples: Vec::new(),
            comparisons: Vec::new(),
            errors: 0,
        }
    }

    /// Only warnings and errors are printed
    pub fn quiet(format: OutputFormat) -> Self {
        Self {
            quiet: true,
            ..Self::new(format)
        }
    }

    /// Print events until the worker finishes, then wait for its task
    pub async fn follow(&mut self, mut worker: WorkerHandle) -> Result<()> {
        while let Some(event) = worker.next_event().await {
            if !self.handle(event) {
                break;
            }
        }
        self.end_progress();
        worker.task.await.context("Background worker panicked")?;
        Ok(())
    }

    /// Print everything already queued on `events`
    pub fn drain(&mut self, events: &mut mpsc::UnboundedReceiver<BenchEvent>) {
        while let Ok(event) = events.try_recv() {
            if !self.handle(event) {
                break;
            }
        }
        self.end_progress();
    }

    /// Render one event; `false` once the worker has finished
    pub fn handle(&mut self, event: BenchEvent) -> bool {
        match event {
            BenchEvent::Log { level, message } => self.log(level, &message),
            BenchEvent::Progress { percent } => {
                self.show_progress(&format!("Progress {}%", percent));
            }
            BenchEvent::Sample(record) => {
                if !self.structured() {
                    self.log(
                        LogLevel::Info,
                        &format!(
                            "{} ctx: {} t/s | VRAM: {} | Temp: {}",
                            record.context_size,
                            format_tps(record.tokens_per_second),
                            record.vram_display(),
                            record.temperature_display()
                        ),
                    );
                }
                self.samples.push(record);
            }
            BenchEvent::Comparison(row) => {
                if !self.structured() {
                    self.log(
                        LogLevel::Info,
                        &format!(
                            "{} ctx: {} {} t/s vs {} {} t/s",
                            row.context_size,
                            row.model_a,
                            format_tps(row.tps_a),
                            row.model_b,
                            format_tps(row.tps_b)
                        ),
                    );
                }
                self.comparisons.push(row);
            }
            BenchEvent::PullProgress(record) => {
                if let PullProgress::Transfer { .. } = record {
                    let percent = record.percent().unwrap_or(0.0);
                    self.show_progress(&format!("{} {:.0}%", record.status(), percent));
                }
            }
            BenchEvent::Finished => return false,
        }
        true
    }

    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    pub fn comparisons(&self) -> &[ComparisonRow] {
        &self.comparisons
    }

    /// Number of error lines seen so far
    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }

    fn structured(&self) -> bool {
        self.formatter.format().is_structured()
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        if level == LogLevel::Error {
            self.errors += 1;
        }
        if self.quiet && matches!(level, LogLevel::Info | LogLevel::Success) {
            return;
        }

        self.end_progress();
        let line = log_line(Local::now(), message);
        let styled = match level {
            LogLevel::Info => line.normal(),
            LogLevel::Success => line.green(),
            LogLevel::Warn => line.yellow(),
            LogLevel::Error => line.red(),
        };

        // Keep stdout clean for JSON/YAML
        if self.structured() || matches!(level, LogLevel::Warn | LogLevel::Error) {
            eprintln!("{}", styled);
        } else {
            println!("{}", styled);
        }
    }

    fn show_progress(&mut self, message: &str) {
        if self.quiet {
            return;
        }
        self.formatter.print_progress(message);
        self.progress_shown = true;
    }

    fn end_progress(&mut self) {
        if self.progress_shown {
            self.formatter.clear_progress();
            self.progress_shown = false;
        }
    }
}

/// `[HH:MM:SS] message`
pub fn log_line(at: DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", at.format("%H:%M:%S"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::{SampleStatus, Winner};
    use bench_engine::worker;
    use chrono::TimeZone;

    fn sample(context_size: u32) -> SampleRecord {
        SampleRecord {
            model: "llama3.2:3b".to_string(),
            context_size,
            tokens_per_second: 50.0,
            vram_used_mb: None,
            temperature_c: None,
            status: SampleStatus::Ok,
        }
    }

    #[test]
    fn test_log_line_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 10, 19, 9, 5, 7).unwrap();
        assert_eq!(log_line(at, "API connection OK"), "[09:05:07] API connection OK");
    }

    #[test]
    fn test_collects_results_and_errors() {
        let mut console = Console::new(OutputFormat::Json);

        assert!(console.handle(BenchEvent::Sample(sample(4096))));
        assert!(console.handle(BenchEvent::Comparison(ComparisonRow {
            context_size: 8192,
            model_a: "a".to_string(),
            model_b: "b".to_string(),
            tps_a: 1.0,
            tps_b: 2.0,
            diff_percent: -50.0,
            winner: Winner::B,
        })));
        assert!(console.handle(BenchEvent::Log {
            level: LogLevel::Error,
            message: "Error @ 8192 ctx: oom".to_string(),
        }));
        assert!(console.handle(BenchEvent::Progress { percent: 50 }));
        assert!(!console.handle(BenchEvent::Finished));

        assert_eq!(console.samples().len(), 1);
        assert_eq!(console.comparisons().len(), 1);
        assert_eq!(console.errors(), 1);
    }

    #[test]
    fn test_quiet_still_counts_errors() {
        let mut console = Console::quiet(OutputFormat::Table);
        console.handle(BenchEvent::Log {
            level: LogLevel::Info,
            message: "Loaded 2 models (1 local)".to_string(),
        });
        console.handle(BenchEvent::Log {
            level: LogLevel::Error,
            message: "Could not load model list".to_string(),
        });
        assert_eq!(console.errors(), 1);
    }

    #[tokio::test]
    async fn test_follow_worker() {
        let handle = worker::spawn(|events| async move {
            events.info("starting");
            events.send(BenchEvent::Sample(sample(4096)));
            events.send(BenchEvent::Sample(sample(8192)));
        });

        let mut console = Console::new(OutputFormat::Yaml);
        console.follow(handle).await.unwrap();

        let sizes: Vec<u32> = console.samples().iter().map(|s| s.context_size).collect();
        assert_eq!(sizes, vec![4096, 8192]);
        assert_eq!(console.errors(), 0);
    }

    #[test]
    fn test_drain_queued_events() {
        let (sink, mut rx) = bench_engine::EventSink::channel();
        sink.warn("Stop command reported no running server");
        sink.send(BenchEvent::Sample(sample(4096)));

        let mut console = Console::new(OutputFormat::Json);
        console.drain(&mut rx);
        assert_eq!(console.samples().len(), 1);
    }
}
