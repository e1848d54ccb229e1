use std::time::Instant;

use chrono::Utc;

use crate::error::{IdeatorError, Result};
use crate::pipeline::{IdeationResult, StageExecutor, StageGraph, StageOutput};

/// Runs a validated stage graph front to back
pub struct Pipeline {
    graph: StageGraph,
    executor: StageExecutor,
    /// Recorded as the run's model identifier
    model: String,
}

impl Pipeline {
    pub fn new(graph: StageGraph, executor: StageExecutor, model: impl Into<String>) -> Self {
        Self {
            graph,
            executor,
            model: model.into(),
        }
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Execute every stage in declared order. The first failure aborts the run;
    /// nothing is retried and no partial result is returned.
    pub async fn run(&self) -> Result<IdeationResult> {
        let mut result = IdeationResult::new(Utc::now(), self.model.clone());
        tracing::info!(
            stages = self.graph.len(),
            "Starting ideation run: {}",
            self.graph.describe()
        );

        for spec in self.graph.stages() {
            let context = spec
                .context
                .iter()
                .map(|name| {
                    result.get(name).ok_or_else(|| {
                        IdeatorError::config(format!(
                            "stage '{}' needs context from '{}', which has not run",
                            spec.name, name
                        ))
                    })
                })
                .collect::<Result<Vec<&StageOutput>>>()?;

            tracing::info!(
                stage = %spec.name,
                kind = %spec.kind,
                model = %spec.model,
                temperature = spec.temperature,
                context = ?spec.context,
                "Running stage"
            );
            let started = Instant::now();
            let raw_text = self.executor.execute(spec, &context).await?;
            tracing::info!(
                stage = %spec.name,
                chars = raw_text.chars().count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Stage complete"
            );

            result.record(StageOutput {
                stage_name: spec.name.clone(),
                kind: spec.kind,
                raw_text,
                context_stage_names: spec.context.clone(),
            })?;
        }

        tracing::info!("Ideation run finished");
        Ok(result)
    }
}
