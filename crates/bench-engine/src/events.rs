//! Events sent from background workers to the interactive surface

use bench_core::{ComparisonRow, PullProgress, SampleRecord};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a user-facing log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Everything a worker reports while it runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BenchEvent {
    Log { level: LogLevel, message: String },
    /// Overall completion of the running action, 0..=100
    Progress { percent: u8 },
    Sample(SampleRecord),
    Comparison(ComparisonRow),
    PullProgress(PullProgress),
    /// The worker is done; no further events follow
    Finished,
}

/// Sending half of a worker's event stream.
///
/// Log lines are mirrored to `tracing` at debug level; the receiving side
/// owns user-facing output. A dropped receiver is ignored so a worker always
/// runs to completion.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<BenchEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<BenchEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BenchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: BenchEvent) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        debug!(%level, "{}", message);
        self.send(BenchEvent::Log { level, message });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Report that `done` of `total` steps have completed
    pub fn progress(&self, done: usize, total: usize) {
        let percent = progress_percent(done, total);
        debug!("Progress {}% ({}/{})", percent, done, total);
        self.send(BenchEvent::Progress { percent });
    }
}

/// `done * 100 / total`, clamped to 100; an empty plan counts as complete
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(1, 4), 25);
        assert_eq!(progress_percent(4, 4), 100);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(5, 4), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn test_sink_delivers_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.info("starting");
        sink.progress(1, 2);
        sink.send(BenchEvent::Finished);

        assert_eq!(
            rx.try_recv().unwrap(),
            BenchEvent::Log { level: LogLevel::Info, message: "starting".to_string() }
        );
        assert_eq!(rx.try_recv().unwrap(), BenchEvent::Progress { percent: 50 });
        assert_eq!(rx.try_recv().unwrap(), BenchEvent::Finished);
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.error("nobody is listening");
    }

    #[test]
    fn test_event_json_shape() {
        let event = BenchEvent::PullProgress(PullProgress::Transfer {
            status: "pulling 6a07".to_string(),
            completed: 1,
            total: 2,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "pull_progress");
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["completed"], 1);

        let json = serde_json::to_value(BenchEvent::Finished).unwrap();
        assert_eq!(json["event"], "finished");
    }
}
