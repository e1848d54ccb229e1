//! Stage graph: which stages run, in what order, and what each one may see
//!
//! Blinding is nothing more than a shorter context list. The graph is
//! validated once, when it is built, so a bad reference fails before the
//! first generation call.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IdeatorError, Result};

/// Keys the JSON report uses for run metadata; a stage may not take them
pub const RESERVED_STAGE_NAMES: [&str; 3] = ["timestamp", "model", "pipeline"];

/// The six prompt roles a stage can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageKind {
    #[serde(rename = "generation")]
    Generation,
    #[serde(rename = "amplification_1")]
    Amplification1,
    #[serde(rename = "amplification_2")]
    Amplification2,
    #[serde(rename = "evaluation")]
    Evaluation,
    #[serde(rename = "categorization")]
    Categorization,
    #[serde(rename = "synthesis")]
    Synthesis,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Generation,
        StageKind::Amplification1,
        StageKind::Amplification2,
        StageKind::Evaluation,
        StageKind::Categorization,
        StageKind::Synthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Generation => "generation",
            StageKind::Amplification1 => "amplification_1",
            StageKind::Amplification2 => "amplification_2",
            StageKind::Evaluation => "evaluation",
            StageKind::Categorization => "categorization",
            StageKind::Synthesis => "synthesis",
        }
    }

    /// Stage name used by the built-in topologies and as the JSON key
    pub fn default_stage_name(&self) -> &'static str {
        match self {
            StageKind::Generation => "generation",
            StageKind::Amplification1 => "amplified_1",
            StageKind::Amplification2 => "amplified_2",
            StageKind::Evaluation => "evaluation",
            StageKind::Categorization => "categorization",
            StageKind::Synthesis => "final",
        }
    }

    /// Short agent label for pipeline summaries
    pub fn agent_label(&self) -> &'static str {
        match self {
            StageKind::Generation => "Generator",
            StageKind::Amplification1 => "Amplifier #1",
            StageKind::Amplification2 => "Amplifier #2",
            StageKind::Evaluation => "Evaluator",
            StageKind::Categorization => "Categorizer",
            StageKind::Synthesis => "Synthesizer",
        }
    }

    /// Default sampling temperature for the stage persona
    pub fn default_temperature(&self) -> f32 {
        match self {
            StageKind::Generation => 0.9,
            StageKind::Amplification1 => 0.95,
            StageKind::Amplification2 => 0.9,
            StageKind::Evaluation => 0.7,
            StageKind::Categorization => 0.7,
            StageKind::Synthesis => 0.7,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = IdeatorError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        StageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle || k.default_stage_name() == needle)
            .ok_or_else(|| IdeatorError::config(format!("unknown stage kind '{}'", s)))
    }
}

/// Built-in stage layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// generation, two blinded amplifiers, evaluation, categorization, final
    #[default]
    Blinded,
    /// generation, evaluation, categorization, final
    Linear,
}

impl FromStr for Topology {
    type Err = IdeatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blinded" => Ok(Topology::Blinded),
            "linear" => Ok(Topology::Linear),
            other => Err(IdeatorError::config(format!(
                "unknown topology '{}' (expected blinded or linear)",
                other
            ))),
        }
    }
}

/// What the second amplifier is shown in the blinded topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amplifier2Source {
    #[default]
    Generation,
    #[serde(rename = "amplified_1")]
    Amplified1,
}

impl FromStr for Amplifier2Source {
    type Err = IdeatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generation" => Ok(Amplifier2Source::Generation),
            "amplified_1" => Ok(Amplifier2Source::Amplified1),
            other => Err(IdeatorError::config(format!(
                "amplifier 2 can see 'generation' or 'amplified_1', not '{}'",
                other
            ))),
        }
    }
}

/// One stage as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub kind: StageKind,
    /// Upstream stages whose raw output this stage receives, in order
    pub context: Vec<String>,
    pub model: String,
    pub temperature: f32,
}

/// Validated, ordered list of stages
#[derive(Debug, Clone, PartialEq)]
pub struct StageGraph {
    stages: Vec<StageSpec>,
}

impl StageGraph {
    /// Validate and wrap a stage list: names unique, every context reference
    /// pointing at a stage declared strictly earlier.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self> {
        if stages.is_empty() {
            return Err(IdeatorError::config("stage graph has no stages"));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for stage in &stages {
            if stage.name.trim().is_empty() {
                return Err(IdeatorError::config("stage name must not be empty"));
            }
            if RESERVED_STAGE_NAMES.contains(&stage.name.as_str()) {
                return Err(IdeatorError::config(format!(
                    "stage name '{}' is reserved",
                    stage.name
                )));
            }
            for upstream in &stage.context {
                if upstream == &stage.name {
                    return Err(IdeatorError::config(format!(
                        "stage '{}' lists itself as context",
                        stage.name
                    )));
                }
                if !seen.contains(upstream.as_str()) {
                    return Err(IdeatorError::config(format!(
                        "stage '{}' needs context from '{}', which has not run before it",
                        stage.name, upstream
                    )));
                }
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(IdeatorError::config(format!(
                    "stage name '{}' is declared twice",
                    stage.name
                )));
            }
        }
        Ok(Self { stages })
    }

    /// Build one of the built-in layouts. `settings` supplies model and
    /// temperature per stage kind.
    pub fn from_topology(
        topology: Topology,
        amplifier_2_sees: Amplifier2Source,
        settings: impl Fn(StageKind) -> (String, f32),
    ) -> Result<Self> {
        let stage = |kind: StageKind, context: &[StageKind]| {
            let (model, temperature) = settings(kind);
            StageSpec {
                name: kind.default_stage_name().to_string(),
                kind,
                context: context
                    .iter()
                    .map(|k| k.default_stage_name().to_string())
                    .collect(),
                model,
                temperature,
            }
        };

        use StageKind::*;
        let stages = match topology {
            Topology::Linear => vec![
                stage(Generation, &[]),
                stage(Evaluation, &[Generation]),
                stage(Categorization, &[Generation]),
                stage(Synthesis, &[Generation, Evaluation, Categorization]),
            ],
            Topology::Blinded => {
                let second_sees = match amplifier_2_sees {
                    Amplifier2Source::Generation => Generation,
                    Amplifier2Source::Amplified1 => Amplification1,
                };
                let reviewed = [Generation, Amplification1, Amplification2];
                vec![
                    stage(Generation, &[]),
                    stage(Amplification1, &[Generation]),
                    stage(Amplification2, &[second_sees]),
                    stage(Evaluation, &reviewed),
                    stage(Categorization, &reviewed),
                    stage(
                        Synthesis,
                        &[
                            Generation,
                            Amplification1,
                            Amplification2,
                            Evaluation,
                            Categorization,
                        ],
                    ),
                ]
            }
        };
        Self::new(stages)
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn get(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `Generator -> Amplifier #1 (blinded) -> ...` summary line
    pub fn describe(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                // blinded: sees fewer stages than have already run
                if s.context.len() < idx {
                    format!("{} (blinded)", s.kind.agent_label())
                } else {
                    s.kind.agent_label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(kind: StageKind) -> (String, f32) {
        ("test/model".to_string(), kind.default_temperature())
    }

    fn spec(name: &str, context: &[&str]) -> StageSpec {
        StageSpec {
            name: name.into(),
            kind: StageKind::Generation,
            context: context.iter().map(|s| s.to_string()).collect(),
            model: "m".into(),
            temperature: 0.5,
        }
    }

    #[test]
    fn test_blinded_layout() {
        let graph =
            StageGraph::from_topology(Topology::Blinded, Amplifier2Source::Generation, fixed)
                .unwrap();
        let names: Vec<_> = graph.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "generation",
                "amplified_1",
                "amplified_2",
                "evaluation",
                "categorization",
                "final"
            ]
        );
        assert_eq!(graph.get("amplified_1").unwrap().context, ["generation"]);
        assert_eq!(graph.get("amplified_2").unwrap().context, ["generation"]);
        assert_eq!(
            graph.get("evaluation").unwrap().context,
            ["generation", "amplified_1", "amplified_2"]
        );
        assert_eq!(graph.get("final").unwrap().context.len(), 5);
    }

    #[test]
    fn test_second_amplifier_can_see_first() {
        let graph =
            StageGraph::from_topology(Topology::Blinded, Amplifier2Source::Amplified1, fixed)
                .unwrap();
        assert_eq!(graph.get("amplified_2").unwrap().context, ["amplified_1"]);
    }

    #[test]
    fn test_linear_layout() {
        let graph =
            StageGraph::from_topology(Topology::Linear, Amplifier2Source::Generation, fixed)
                .unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.get("categorization").unwrap().context, ["generation"]);
        assert_eq!(
            graph.get("final").unwrap().context,
            ["generation", "evaluation", "categorization"]
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = StageGraph::new(vec![spec("a", &["b"]), spec("b", &[])]).unwrap_err();
        assert!(matches!(err, IdeatorError::Config { .. }));
    }

    #[test]
    fn test_unknown_and_self_reference_rejected() {
        assert!(StageGraph::new(vec![spec("a", &["ghost"])]).is_err());
        assert!(StageGraph::new(vec![spec("a", &["a"])]).is_err());
        assert!(StageGraph::new(vec![spec("a", &[]), spec("a", &[])]).is_err());
        assert!(StageGraph::new(vec![]).is_err());
        assert!(StageGraph::new(vec![spec("model", &[])]).is_err());
    }

    #[test]
    fn test_stage_kind_parses_kind_or_stage_name() {
        assert_eq!("final".parse::<StageKind>().unwrap(), StageKind::Synthesis);
        assert_eq!(
            "amplification_2".parse::<StageKind>().unwrap(),
            StageKind::Amplification2
        );
        assert!("review".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_describe_marks_blinded_stages() {
        let graph =
            StageGraph::from_topology(Topology::Blinded, Amplifier2Source::Generation, fixed)
                .unwrap();
        assert_eq!(
            graph.describe(),
            "Generator -> Amplifier #1 -> Amplifier #2 (blinded) -> Evaluator -> Categorizer (blinded) -> Synthesizer"
        );
    }
}
