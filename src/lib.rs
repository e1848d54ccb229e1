pub mod clients;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod render;

use std::sync::Arc;

use crate::clients::{OpenRouterClient, TextGenerator};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{Pipeline, StageExecutor};
use crate::prompts::PromptRegistry;

/// Install the stderr tracing subscriber used by both binaries.
/// `RUST_LOG` wins; otherwise this crate logs at info.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weird_ideator=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Assemble a pipeline from configuration around any generator.
/// The stage graph is validated here, before anything is called.
pub fn build_pipeline(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<Pipeline> {
    let graph = config.stage_graph()?;
    let registry = Arc::new(PromptRegistry::new());
    let executor = StageExecutor::new(generator, registry, config.template_vars());
    Ok(Pipeline::new(graph, executor, config.model.clone()))
}

/// Pipeline backed by the OpenRouter client. Fails on a missing API key.
pub fn openrouter_pipeline(config: &Config) -> Result<Pipeline> {
    let api_key = config.require_api_key()?;
    let client = OpenRouterClient::new(api_key, &config.base_url, config.request_timeout())
        .map_err(|e| crate::error::IdeatorError::config(format!("HTTP client: {e}")))?;
    build_pipeline(config, Arc::new(client))
}
