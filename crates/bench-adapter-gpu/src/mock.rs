//! Mock telemetry source for testing

use bench_core::{GpuReading, GpuSnapshot, GpuTelemetry, UnavailableReason};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Replays scripted snapshots, then repeats the last one
pub struct MockGpuTelemetry {
    script: Mutex<VecDeque<GpuSnapshot>>,
    last: Mutex<GpuSnapshot>,
    calls: AtomicUsize,
}

impl MockGpuTelemetry {
    /// Always return `snapshot`
    pub fn constant(snapshot: GpuSnapshot) -> Self {
        Self::sequence(vec![snapshot])
    }

    /// Return `snapshots` in order; an empty script reads as unavailable
    pub fn sequence(snapshots: Vec<GpuSnapshot>) -> Self {
        Self {
            script: Mutex::new(snapshots.into()),
            last: Mutex::new(GpuSnapshot::unavailable(UnavailableReason::ToolMissing)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A mid-range card at a comfortable temperature
    pub fn healthy() -> Self {
        Self::constant(GpuSnapshot::Available(GpuReading {
            name: "Mock GPU".to_string(),
            memory_used_mb: 4096,
            memory_total_mb: 16384,
            temperature_c: 55,
        }))
    }

    pub fn unavailable(reason: UnavailableReason) -> Self {
        Self::constant(GpuSnapshot::unavailable(reason))
    }

    /// Number of snapshots taken so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GpuTelemetry for MockGpuTelemetry {
    async fn snapshot(&self) -> GpuSnapshot {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut last = self.last.lock().await;
        if let Some(next) = self.script.lock().await.pop_front() {
            *last = next;
        }
        last.clone()
    }
}
