//! Head-to-head throughput comparison of two models

use crate::events::{BenchEvent, EventSink};
use crate::throughput::{compare_throughput, response_tps};
use bench_core::{ComparisonRow, CompareConfig, GenerateRequest, InferenceClient, Result};

use std::sync::Arc;

/// What to compare
#[derive(Debug, Clone, PartialEq)]
pub struct ComparePlan {
    pub model_a: String,
    pub model_b: String,
    pub contexts: Vec<u32>,
    pub prompt: String,
}

impl ComparePlan {
    pub fn from_config(model_a: impl Into<String>, model_b: impl Into<String>, config: &CompareConfig) -> Self {
        Self {
            model_a: model_a.into(),
            model_b: model_b.into(),
            contexts: config.contexts.clone(),
            prompt: config.prompt.clone(),
        }
    }

    // No keep-alive: the server default applies
    fn request(&self, model: &str, context_size: u32) -> GenerateRequest {
        GenerateRequest::new(model, self.prompt.clone()).with_context_size(context_size)
    }
}

/// Runs comparisons against an inference server
pub struct ModelComparison {
    client: Arc<dyn InferenceClient>,
}

impl ModelComparison {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Compare at every size in order.
    ///
    /// A failure at one size is logged and the next size still runs.
    pub async fn run(&self, plan: &ComparePlan, events: &EventSink) -> Vec<ComparisonRow> {
        let total = plan.contexts.len();
        let mut rows = Vec::with_capacity(total);

        events.info(format!("Comparing {} vs {}", plan.model_a, plan.model_b));

        for (i, &context_size) in plan.contexts.iter().enumerate() {
            match self.compare_at(plan, context_size).await {
                Ok(row) => {
                    events.send(BenchEvent::Comparison(row.clone()));
                    rows.push(row);
                }
                Err(e) => {
                    events.error(format!(
                        "Error comparing {} and {} @ {} ctx: {}",
                        plan.model_a, plan.model_b, context_size, e
                    ));
                }
            }
            events.progress(i + 1, total);
        }

        events.info(format!("Comparison of {} vs {} finished", plan.model_a, plan.model_b));
        rows
    }

    async fn compare_at(&self, plan: &ComparePlan, context_size: u32) -> Result<ComparisonRow> {
        let response_a = self.client.generate(&plan.request(&plan.model_a, context_size)).await?;
        let response_b = self.client.generate(&plan.request(&plan.model_b, context_size)).await?;

        let tps_a = response_tps(&response_a);
        let tps_b = response_tps(&response_b);
        let (diff_percent, winner) = compare_throughput(tps_a, tps_b);

        Ok(ComparisonRow {
            context_size,
            model_a: plan.model_a.clone(),
            model_b: plan.model_b.clone(),
            tps_a,
            tps_b,
            diff_percent,
            winner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_adapter_runtime::mock::MockInferenceClient;
    use bench_core::Winner;

    fn plan() -> ComparePlan {
        ComparePlan::from_config("llama3.2:3b", "mistral:latest", &CompareConfig::default())
    }

    #[tokio::test]
    async fn test_comparison_rows() {
        let client = Arc::new(
            MockInferenceClient::new()
                .with_response("llama3.2:3b", 8192, 120, 2_000_000_000)
                .with_response("mistral:latest", 8192, 100, 2_000_000_000)
                .with_response("llama3.2:3b", 16384, 80, 2_000_000_000)
                .with_response("mistral:latest", 16384, 100, 2_000_000_000),
        );
        let comparison = ModelComparison::new(client.clone());
        let (sink, _rx) = EventSink::channel();

        let rows = comparison.run(&plan(), &sink).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].context_size, 8192);
        assert!((rows[0].diff_percent - 20.0).abs() < 1e-9);
        assert_eq!(rows[0].winner, Winner::A);
        assert_eq!(rows[0].winner_name(), "llama3.2:3b");
        assert_eq!(rows[1].winner, Winner::B);

        // A runs before B at each size, with no keep-alive
        let requests = client.requests().await;
        let order: Vec<(&str, Option<u32>)> = requests
            .iter()
            .map(|r| (r.model.as_str(), r.context_size()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("llama3.2:3b", Some(8192)),
                ("mistral:latest", Some(8192)),
                ("llama3.2:3b", Some(16384)),
                ("mistral:latest", Some(16384)),
            ]
        );
        assert!(requests.iter().all(|r| r.keep_alive.is_none()));
        assert!(requests.iter().all(|r| r.prompt.as_deref() == Some("Say Hello")));
    }

    #[tokio::test]
    async fn test_failure_continues_with_next_size() {
        let client = Arc::new(MockInferenceClient::new().with_failure("mistral:latest", 8192, "oom"));
        let comparison = ModelComparison::new(client);
        let (sink, mut rx) = EventSink::channel();

        let rows = comparison.run(&plan(), &sink).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].context_size, 16384);

        let mut saw_error = false;
        let mut progress = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                BenchEvent::Log { message, .. } if message.contains("oom") => saw_error = true,
                BenchEvent::Progress { percent } => progress.push(percent),
                _ => {}
            }
        }
        assert!(saw_error);
        assert_eq!(progress, vec![50, 100]);
    }
}
