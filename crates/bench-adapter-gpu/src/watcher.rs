//! Periodic telemetry polling

use bench_core::{GpuSnapshot, GpuTelemetry};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Polls a telemetry source and forwards every snapshot.
///
/// The first snapshot is taken immediately. Polling stops once the
/// receiving side is dropped.
pub struct GpuWatcher {
    telemetry: Arc<dyn GpuTelemetry>,
    interval: Duration,
}

impl GpuWatcher {
    pub fn new(telemetry: Arc<dyn GpuTelemetry>, interval: Duration) -> Self {
        Self { telemetry, interval }
    }

    /// Start polling on a background task
    pub fn spawn(self) -> (JoinHandle<()>, mpsc::UnboundedReceiver<GpuSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(tx));
        (handle, rx)
    }

    /// Poll until `tx` is closed
    pub async fn run(self, tx: mpsc::UnboundedSender<GpuSnapshot>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let snapshot = self.telemetry.snapshot().await;
            if tx.send(snapshot).is_err() {
                debug!("GPU watcher receiver dropped, stopping");
                break;
            }
        }
    }
}
