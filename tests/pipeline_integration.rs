use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use weird_ideator::clients::{GenerationError, GenerationRequest, TextGenerator};
use weird_ideator::config::Config;
use weird_ideator::error::IdeatorError;
use weird_ideator::pipeline::StageKind;

/// Records every request and answers with a numbered reply.
/// `fail_on` makes the n-th call (1-based) fail.
#[derive(Default)]
struct Scripted {
    calls: Mutex<Vec<GenerationRequest>>,
    fail_on: Option<usize>,
}

impl Scripted {
    fn failing_at(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len()
        };
        if self.fail_on == Some(n) {
            return Err(GenerationError::Status {
                status: 500,
                body: "provider exploded".into(),
            });
        }
        Ok(format!("REPLY-{n}\n1. Idea number {n}\nDescription: reply {n}."))
    }
}

fn config(pairs: &[(&str, &str)]) -> Config {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_sources(None, &env).unwrap()
}

#[tokio::test]
async fn blinded_run_invokes_six_stages_in_order() {
    let generator = Arc::new(Scripted::default());
    let pipeline =
        weird_ideator::build_pipeline(&config(&[("NUM_IDEAS", "4")]), generator.clone()).unwrap();

    let result = pipeline.run().await.unwrap();

    assert_eq!(
        result.stage_names().collect::<Vec<_>>(),
        [
            "generation",
            "amplified_1",
            "amplified_2",
            "evaluation",
            "categorization",
            "final"
        ]
    );
    let calls = generator.calls();
    assert_eq!(calls.len(), 6);
    assert!(calls[0].prompt.contains("Generate 4 WEIRD"));
    assert!(!calls[0].prompt.contains("REPLY-"));
    assert_eq!(result.text("final").unwrap().lines().next(), Some("REPLY-6"));
}

#[tokio::test]
async fn amplifiers_are_blinded_to_each_other() {
    let generator = Arc::new(Scripted::default());
    let pipeline = weird_ideator::build_pipeline(&config(&[]), generator.clone()).unwrap();
    let result = pipeline.run().await.unwrap();

    let calls = generator.calls();
    // amplifier 2 sees the generation output only
    assert!(calls[2].prompt.contains("REPLY-1"));
    assert!(!calls[2].prompt.contains("REPLY-2"));
    assert_eq!(
        result.get("amplified_2").unwrap().context_stage_names,
        ["generation"]
    );

    // evaluation sees all three idea sets, in order
    let eval = &calls[3].prompt;
    let positions: Vec<usize> = ["REPLY-1", "REPLY-2", "REPLY-3"]
        .iter()
        .map(|m| eval.find(m).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    // categorization does not see the evaluation
    assert!(!calls[4].prompt.contains("REPLY-4"));
    // the synthesizer sees everything
    for n in 1..=5 {
        assert!(calls[5].prompt.contains(&format!("REPLY-{n}")));
    }
}

#[tokio::test]
async fn second_amplifier_can_be_shown_first() {
    let generator = Arc::new(Scripted::default());
    let pipeline = weird_ideator::build_pipeline(
        &config(&[("IDEATOR_AMPLIFIER_2_SEES", "amplified_1")]),
        generator.clone(),
    )
    .unwrap();
    let result = pipeline.run().await.unwrap();

    assert_eq!(
        result.get("amplified_2").unwrap().context_stage_names,
        ["amplified_1"]
    );
    let calls = generator.calls();
    assert!(calls[2].prompt.contains("REPLY-2"));
    assert!(!calls[2].prompt.contains("REPLY-1"));
}

#[tokio::test]
async fn linear_run_has_four_stages() {
    let generator = Arc::new(Scripted::default());
    let pipeline =
        weird_ideator::build_pipeline(&config(&[("IDEATOR_TOPOLOGY", "linear")]), generator.clone())
            .unwrap();
    let result = pipeline.run().await.unwrap();
    assert_eq!(
        result.stage_names().collect::<Vec<_>>(),
        ["generation", "evaluation", "categorization", "final"]
    );
    assert_eq!(generator.calls().len(), 4);
}

#[tokio::test]
async fn failure_stops_the_run() {
    let generator = Arc::new(Scripted::failing_at(3));
    let pipeline = weird_ideator::build_pipeline(&config(&[]), generator.clone()).unwrap();

    let err = pipeline.run().await.unwrap_err();

    match err {
        IdeatorError::ExternalCall { stage, message } => {
            assert_eq!(stage, "amplified_2");
            assert!(message.contains("provider exploded"));
        }
        other => panic!("expected ExternalCall, got {other:?}"),
    }
    assert_eq!(generator.calls().len(), 3);
}

#[tokio::test]
async fn invalid_graph_fails_before_any_call() {
    let toml = r#"
        [[pipeline.stages]]
        name = "generation"
        kind = "generation"

        [[pipeline.stages]]
        name = "final"
        kind = "synthesis"
        context = ["generation", "evaluation"]
    "#;
    let config = Config::from_sources(Some(toml), &HashMap::new()).unwrap();
    let generator = Arc::new(Scripted::default());

    let err = weird_ideator::build_pipeline(&config, generator.clone())
        .err()
        .expect("graph should be rejected");

    assert!(matches!(err, IdeatorError::Config { .. }));
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn stage_settings_reach_the_generator() {
    let generator = Arc::new(Scripted::default());
    let pipeline = weird_ideator::build_pipeline(
        &config(&[
            ("IDEATOR_MODEL", "base/model"),
            ("IDEATOR_SYNTHESIZER_MODEL", "big/model"),
        ]),
        generator.clone(),
    )
    .unwrap();
    pipeline.run().await.unwrap();

    let calls = generator.calls();
    assert_eq!(calls[0].model, "base/model");
    assert_eq!(calls[5].model, "big/model");
    assert_eq!(calls[1].temperature, StageKind::Amplification1.default_temperature());
    assert!(calls.iter().all(|c| c.system.is_some()));
}

#[tokio::test]
async fn temperature_override_applies_to_all_calls() {
    let generator = Arc::new(Scripted::default());
    let pipeline =
        weird_ideator::build_pipeline(&config(&[("TEMPERATURE", "0.4")]), generator.clone())
            .unwrap();
    pipeline.run().await.unwrap();
    assert!(generator.calls().iter().all(|c| c.temperature == 0.4));
}
