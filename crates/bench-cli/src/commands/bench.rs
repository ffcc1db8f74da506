//! Stress sweep and model comparison commands

use crate::client::StudioClient;
use crate::commands::models::load_catalog_quietly;
use crate::console::Console;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use bench_engine::{worker, ComparePlan, SweepPlan};

/// Command-line overrides for a sweep
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    pub contexts: Option<Vec<u32>>,
    pub prompt: Option<String>,
    pub keep_alive: Option<String>,
}

/// Measure throughput of one model across context sizes
pub async fn stress(
    client: &StudioClient,
    model: Option<String>,
    options: SweepOptions,
    output_format: OutputFormat,
) -> Result<()> {
    let mut studio = client.studio().clone();
    if let Some(contexts) = options.contexts {
        studio.stress.contexts = contexts;
    }
    if let Some(prompt) = options.prompt {
        studio.stress.prompt = prompt;
    }
    if let Some(keep_alive) = options.keep_alive {
        studio.stress.keep_alive = keep_alive;
    }
    studio.validate().context("Invalid stress test options")?;

    let model = match model {
        Some(model) => model,
        None => load_catalog_quietly(client, output_format)
            .await?
            .default_bench_model()
            .map(str::to_string)
            .context("No local models installed")?,
    };

    let plan = SweepPlan::from_config(model, &studio.stress)?;
    let mut console = Console::new(output_format);
    console
        .follow(worker::spawn_stress(client.inference(), client.telemetry(), plan.clone()))
        .await?;

    console.formatter().print_list(console.samples())?;

    if console.samples().len() < plan.contexts.len() {
        anyhow::bail!(
            "Stress test for {} stopped after {} of {} context sizes",
            plan.model,
            console.samples().len(),
            plan.contexts.len()
        );
    }
    Ok(())
}

/// Compare two models at each context size
pub async fn compare(
    client: &StudioClient,
    model_a: Option<String>,
    model_b: Option<String>,
    contexts: Option<Vec<u32>>,
    prompt: Option<String>,
    output_format: OutputFormat,
) -> Result<()> {
    let mut studio = client.studio().clone();
    if let Some(contexts) = contexts {
        studio.compare.contexts = contexts;
    }
    if let Some(prompt) = prompt {
        studio.compare.prompt = prompt;
    }
    studio.validate().context("Invalid comparison options")?;

    let (model_a, model_b) = match (model_a, model_b) {
        (Some(a), Some(b)) => (a, b),
        (a, b) => {
            let catalog = load_catalog_quietly(client, output_format).await?;
            let a = match (a, &b) {
                (Some(a), _) => a,
                (None, Some(b)) => catalog
                    .default_partner(b)
                    .map(str::to_string)
                    .context("Comparison needs a second local model")?,
                (None, None) => catalog
                    .default_bench_model()
                    .map(str::to_string)
                    .context("No local models installed")?,
            };
            let b = match b {
                Some(b) => b,
                None => catalog
                    .default_partner(&a)
                    .map(str::to_string)
                    .context("Comparison needs a second local model")?,
            };
            (a, b)
        }
    };

    let plan = ComparePlan::from_config(model_a, model_b, &studio.compare);
    let mut console = Console::new(output_format);
    console
        .follow(worker::spawn_compare(client.inference(), plan.clone()))
        .await?;

    console.formatter().print_list(console.comparisons())?;

    if console.errors() > 0 {
        anyhow::bail!(
            "Comparison of {} vs {} had {} failed context sizes",
            plan.model_a,
            plan.model_b,
            console.errors()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{client, client_with};
    use bench_adapter_gpu::mock::MockGpuTelemetry;
    use bench_adapter_runtime::mock::MockInferenceClient;
    use bench_core::{KeepAlive, StudioConfig, UnavailableReason};

    #[tokio::test]
    async fn test_stress_defaults_to_first_local_model() {
        let mock = MockInferenceClient::new().with_models(&["gpt-oss:120b-cloud", "llama3.2:3b"]);
        let app = client(mock.clone());

        let options = SweepOptions {
            contexts: Some(vec![2048, 4096]),
            keep_alive: Some("-1".to_string()),
            ..Default::default()
        };
        stress(&app, None, options, OutputFormat::Json).await.unwrap();

        let requests = mock.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.model == "llama3.2:3b"));
        assert_eq!(requests[1].context_size(), Some(4096));
        assert_eq!(requests[0].keep_alive, Some(KeepAlive::FOREVER));
    }

    #[tokio::test]
    async fn test_stress_without_gpu_still_succeeds() {
        let app = client_with(
            StudioConfig::default(),
            MockInferenceClient::new().with_models(&["llama3.2:3b"]),
            MockGpuTelemetry::unavailable(UnavailableReason::ToolMissing),
        );
        stress(&app, Some("llama3.2:3b".to_string()), SweepOptions::default(), OutputFormat::Json)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stress_failure_is_reported() {
        let mock = MockInferenceClient::new().with_failure("llama3.2:3b", 8192, "out of memory");
        let app = client(mock.clone());

        let err = stress(&app, Some("llama3.2:3b".to_string()), SweepOptions::default(), OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stopped after 1 of 4"));
        assert_eq!(mock.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_stress_rejects_bad_options() {
        let app = client(MockInferenceClient::new());
        let options = SweepOptions {
            keep_alive: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(stress(&app, Some("m".to_string()), options, OutputFormat::Json).await.is_err());

        let options = SweepOptions {
            contexts: Some(vec![]),
            ..Default::default()
        };
        assert!(stress(&app, Some("m".to_string()), options, OutputFormat::Json).await.is_err());
    }

    #[tokio::test]
    async fn test_compare_needs_two_models() {
        let app = client(MockInferenceClient::new().with_models(&["llama3.2:3b", "gpt-oss:120b-cloud"]));
        let err = compare(&app, None, None, None, None, OutputFormat::Json).await.unwrap_err();
        assert!(err.to_string().contains("second local model"));
    }

    #[tokio::test]
    async fn test_compare_default_pair() {
        let mock = MockInferenceClient::new().with_models(&["llama3.2:3b", "mistral:latest"]);
        let app = client(mock.clone());

        compare(&app, None, None, Some(vec![4096]), Some("Hi".to_string()), OutputFormat::Json)
            .await
            .unwrap();

        let models: Vec<String> = mock.requests().await.into_iter().map(|r| r.model).collect();
        assert_eq!(models, vec!["llama3.2:3b".to_string(), "mistral:latest".to_string()]);
    }

    #[tokio::test]
    async fn test_compare_never_pairs_a_model_with_itself() {
        let mock = MockInferenceClient::new().with_models(&["llama3.2:3b", "mistral:latest"]);
        let app = client(mock.clone());

        compare(&app, Some("mistral:latest".to_string()), None, Some(vec![4096]), None, OutputFormat::Json)
            .await
            .unwrap();
        let models: Vec<String> = mock.requests().await.into_iter().map(|r| r.model).collect();
        assert_eq!(models, vec!["mistral:latest".to_string(), "llama3.2:3b".to_string()]);

        let mock = MockInferenceClient::new().with_models(&["llama3.2:3b", "mistral:latest"]);
        let app = client(mock.clone());
        compare(&app, None, Some("llama3.2:3b".to_string()), Some(vec![4096]), None, OutputFormat::Json)
            .await
            .unwrap();
        let models: Vec<String> = mock.requests().await.into_iter().map(|r| r.model).collect();
        assert_eq!(models, vec!["mistral:latest".to_string(), "llama3.2:3b".to_string()]);

        let app = client(MockInferenceClient::new().with_models(&["mistral:latest", "kimi:cloud"]));
        let err = compare(&app, Some("mistral:latest".to_string()), None, None, None, OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("second local model"));
    }

    #[tokio::test]
    async fn test_compare_failure_fails_command() {
        let mock = MockInferenceClient::new().with_failure("b", 8192, "boom");
        let app = client(mock);
        let err = compare(&app, Some("a".to_string()), Some("b".to_string()), None, None, OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 failed"));
    }
}
