use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IdeatorError, Result};
use crate::pipeline::{RESERVED_STAGE_NAMES, StageKind};

/// Raw output of one stage, captured once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage_name: String,
    pub kind: StageKind,
    pub raw_text: String,
    /// Upstream stages whose output was supplied, in order
    pub context_stage_names: Vec<String>,
}

/// Every stage's raw output for a single run
#[derive(Debug, Clone, PartialEq)]
pub struct IdeationResult {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    outputs: Vec<StageOutput>,
}

impl IdeationResult {
    pub fn new(timestamp: DateTime<Utc>, model: impl Into<String>) -> Self {
        Self {
            timestamp,
            model: model.into(),
            outputs: Vec::new(),
        }
    }

    /// Append a stage output. Outputs are write-once: recording the same stage
    /// twice is refused, as is a stage named after a run metadata key.
    pub fn record(&mut self, output: StageOutput) -> Result<()> {
        if RESERVED_STAGE_NAMES.contains(&output.stage_name.as_str()) {
            return Err(IdeatorError::config(format!(
                "stage name '{}' is reserved",
                output.stage_name
            )));
        }
        if self.get(&output.stage_name).is_some() {
            return Err(IdeatorError::config(format!(
                "stage '{}' already has a recorded output",
                output.stage_name
            )));
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn get(&self, stage_name: &str) -> Option<&StageOutput> {
        self.outputs.iter().find(|o| o.stage_name == stage_name)
    }

    /// Raw text recorded for a stage
    pub fn text(&self, stage_name: &str) -> Option<&str> {
        self.get(stage_name).map(|o| o.raw_text.as_str())
    }

    /// Outputs in execution order
    pub fn outputs(&self) -> &[StageOutput] {
        &self.outputs
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.stage_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(name: &str, text: &str) -> StageOutput {
        StageOutput {
            stage_name: name.into(),
            kind: StageKind::Generation,
            raw_text: text.into(),
            context_stage_names: vec![],
        }
    }

    #[test]
    fn test_record_and_lookup() {
        let mut result = IdeationResult::new(Utc::now(), "m");
        result.record(output("generation", "ideas")).unwrap();
        result.record(output("final", "report")).unwrap();
        assert_eq!(result.text("final"), Some("report"));
        assert_eq!(result.text("evaluation"), None);
        assert_eq!(
            result.stage_names().collect::<Vec<_>>(),
            ["generation", "final"]
        );
    }

    #[test]
    fn test_outputs_are_write_once() {
        let mut result = IdeationResult::new(Utc::now(), "m");
        result.record(output("generation", "first")).unwrap();
        assert!(result.record(output("generation", "second")).is_err());
        assert_eq!(result.text("generation"), Some("first"));
    }

    #[test]
    fn test_reserved_stage_names_refused() {
        let mut result = IdeationResult::new(Utc::now(), "m");
        for name in RESERVED_STAGE_NAMES {
            assert!(result.record(output(name, "judge")).is_err());
        }
        assert!(result.outputs().is_empty());
        assert_eq!(result.model, "m");
    }
}
