use std::collections::HashMap;
use std::sync::Arc;

use crate::clients::{GenerationRequest, TextGenerator};
use crate::error::{IdeatorError, Result};
use crate::pipeline::{StageOutput, StageSpec};
use crate::prompts::PromptRegistry;

/// Turns a stage spec plus its context into one generation call
pub struct StageExecutor {
    generator: Arc<dyn TextGenerator>,
    registry: Arc<PromptRegistry>,
    vars: HashMap<String, String>,
}

impl StageExecutor {
    /// `vars` fills template placeholders (`num_ideas`, ...)
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        registry: Arc<PromptRegistry>,
        vars: HashMap<String, String>,
    ) -> Self {
        Self {
            generator,
            registry,
            vars,
        }
    }

    /// Build the request without sending it
    pub fn build_request(
        &self,
        spec: &StageSpec,
        context: &[&StageOutput],
    ) -> Result<GenerationRequest> {
        let prompt = self.registry.require(spec.kind)?;
        let mut text = prompt.render(&self.vars)?;
        tracing::debug!(
            stage = %spec.name,
            prompt = %prompt.id,
            checksum = %prompt.lineage.checksum,
            "Rendered prompt"
        );

        if !context.is_empty() {
            text.push_str("\n\n# Context from earlier stages\n");
            for upstream in context {
                text.push_str(&format!(
                    "\n## Output of stage '{}'\n\n{}\n",
                    upstream.stage_name,
                    upstream.raw_text.trim_end()
                ));
            }
        }

        Ok(GenerationRequest {
            model: spec.model.clone(),
            system: Some(prompt.persona.system_message()),
            prompt: text,
            temperature: spec.temperature,
        })
    }

    /// Run the stage and return the generator's raw text
    pub async fn execute(&self, spec: &StageSpec, context: &[&StageOutput]) -> Result<String> {
        let request = self.build_request(spec, context)?;
        self.generator
            .generate(&request)
            .await
            .map_err(|e| IdeatorError::external(&spec.name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::GenerationError;
    use crate::pipeline::StageKind;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _: &GenerationRequest) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Status {
                status: 429,
                body: "slow down".into(),
            })
        }
    }

    fn executor(generator: Arc<dyn TextGenerator>) -> StageExecutor {
        StageExecutor::new(
            generator,
            Arc::new(PromptRegistry::new()),
            HashMap::from([("num_ideas".to_string(), "3".to_string())]),
        )
    }

    fn spec(kind: StageKind, context: &[&str]) -> StageSpec {
        StageSpec {
            name: kind.default_stage_name().into(),
            kind,
            context: context.iter().map(|s| s.to_string()).collect(),
            model: "google/gemini-2.5-flash-lite".into(),
            temperature: 0.95,
        }
    }

    #[test]
    fn test_request_carries_context_in_order() {
        let exec = executor(Arc::new(Failing));
        let generation = StageOutput {
            stage_name: "generation".into(),
            kind: StageKind::Generation,
            raw_text: "1. Dream Radio".into(),
            context_stage_names: vec![],
        };
        let amp = StageOutput {
            stage_name: "amplified_1".into(),
            kind: StageKind::Amplification1,
            raw_text: "## Concept 1: Louder Dreams".into(),
            context_stage_names: vec!["generation".into()],
        };
        let req = exec
            .build_request(
                &spec(StageKind::Evaluation, &["generation", "amplified_1"]),
                &[&generation, &amp],
            )
            .unwrap();
        let first = req.prompt.find("1. Dream Radio").unwrap();
        let second = req.prompt.find("Louder Dreams").unwrap();
        assert!(first < second);
        assert!(req.system.unwrap().contains("Rigorous Experiment Evaluator"));
        assert_eq!(req.temperature, 0.95);
    }

    #[test]
    fn test_request_without_context_has_no_context_block() {
        let exec = executor(Arc::new(Failing));
        let req = exec
            .build_request(&spec(StageKind::Generation, &[]), &[])
            .unwrap();
        assert!(!req.prompt.contains("Context from earlier stages"));
        assert!(req.prompt.contains("Generate 3 WEIRD"));
    }

    #[tokio::test]
    async fn test_generator_failure_names_stage() {
        let exec = executor(Arc::new(Failing));
        let err = exec
            .execute(&spec(StageKind::Generation, &[]), &[])
            .await
            .unwrap_err();
        match err {
            IdeatorError::ExternalCall { stage, message } => {
                assert_eq!(stage, "generation");
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
