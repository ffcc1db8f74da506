//! Background workers
//!
//! Every user-triggered action runs on its own tokio task and reports back
//! through a [`BenchEvent`] stream that ends with [`BenchEvent::Finished`].
//! There is no cancellation: a started worker runs to completion.

use crate::compare::{ComparePlan, ModelComparison};
use crate::events::{BenchEvent, EventSink};
use crate::models::ModelManager;
use crate::sampler::{SweepPlan, ThroughputSampler};
use bench_core::{GpuTelemetry, InferenceClient};

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A running worker and the receiving end of its events
pub struct WorkerHandle {
    pub events: mpsc::UnboundedReceiver<BenchEvent>,
    pub task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Wait for the next event; `None` once the worker has finished
    pub async fn next_event(&mut self) -> Option<BenchEvent> {
        self.events.recv().await
    }
}

/// Run `action` on a new task; `Finished` is sent after it returns
pub fn spawn<F, Fut>(action: F) -> WorkerHandle
where
    F: FnOnce(EventSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (sink, events) = EventSink::channel();
    let done = sink.clone();
    let work = action(sink);
    let task = tokio::spawn(async move {
        work.await;
        done.send(BenchEvent::Finished);
    });
    WorkerHandle { events, task }
}

/// Run a throughput sweep in the background
pub fn spawn_stress(
    client: Arc<dyn InferenceClient>,
    telemetry: Arc<dyn GpuTelemetry>,
    plan: SweepPlan,
) -> WorkerHandle {
    spawn(move |events| async move {
        ThroughputSampler::new(client, telemetry).run(&plan, &events).await;
    })
}

/// Run a comparison in the background
pub fn spawn_compare(client: Arc<dyn InferenceClient>, plan: ComparePlan) -> WorkerHandle {
    spawn(move |events| async move {
        ModelComparison::new(client).run(&plan, &events).await;
    })
}

/// Download a model in the background
pub fn spawn_pull(manager: ModelManager, model: String) -> WorkerHandle {
    spawn(move |events| async move {
        // Failures are already reported as log events
        let _ = manager.pull(&model, &events).await;
    })
}
