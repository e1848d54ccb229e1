//! JSON form of a run: metadata, the stage plan, and one key per stage
//!
//! ```json
//! {
//!   "timestamp": "2025-03-14T09:26:53Z",
//!   "model": "google/gemini-2.5-flash-lite",
//!   "pipeline": [{"stage": "generation", "kind": "generation", "context": []}, ...],
//!   "generation": "1. Dream Radio ...",
//!   "final": "..."
//! }
//! ```
//!
//! Documents without a `pipeline` array are accepted when their stage keys
//! use the built-in stage names. `timestamp` may be RFC 3339, a naive
//! `YYYY-MM-DDTHH:MM:SS`, or the `YYYYMMDD_HHMMSS` file stamp; the last two
//! are read as local time.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{IdeatorError, Result};
use crate::output::STAMP_FORMAT;
use crate::pipeline::{IdeationResult, StageKind, StageOutput};

#[derive(Debug, Serialize, Deserialize)]
struct PipelineEntry {
    stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<StageKind>,
    #[serde(default)]
    context: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonReport {
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    pipeline: Vec<PipelineEntry>,
    #[serde(flatten)]
    outputs: BTreeMap<String, String>,
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", STAMP_FORMAT];

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()?
            .and_local_timezone(Local)
            .earliest()
            .map(|ts| ts.with_timezone(&Utc))
    })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(raw.trim())
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp '{raw}'")))
}

pub fn render_json(result: &IdeationResult) -> Result<serde_json::Value> {
    let report = JsonReport {
        timestamp: result.timestamp,
        model: result.model.clone(),
        pipeline: result
            .outputs()
            .iter()
            .map(|o| PipelineEntry {
                stage: o.stage_name.clone(),
                kind: Some(o.kind),
                context: o.context_stage_names.clone(),
            })
            .collect(),
        outputs: result
            .outputs()
            .iter()
            .map(|o| (o.stage_name.clone(), o.raw_text.clone()))
            .collect(),
    };
    Ok(serde_json::to_value(report)?)
}

/// Rebuild a run from its JSON form
pub fn parse_json(text: &str) -> Result<IdeationResult> {
    let mut report: JsonReport = serde_json::from_str(text)?;

    if report.pipeline.is_empty() {
        report.pipeline = StageKind::ALL
            .iter()
            .filter(|k| report.outputs.contains_key(k.default_stage_name()))
            .map(|k| PipelineEntry {
                stage: k.default_stage_name().to_string(),
                kind: Some(*k),
                context: Vec::new(),
            })
            .collect();
    }

    let mut result = IdeationResult::new(report.timestamp, report.model);
    for entry in report.pipeline {
        let kind = match entry.kind {
            Some(kind) => kind,
            None => entry.stage.parse().map_err(|_| IdeatorError::Serialization {
                message: format!("stage '{}' has no kind and no built-in name", entry.stage),
            })?,
        };
        let raw_text = report.outputs.remove(&entry.stage).ok_or_else(|| {
            IdeatorError::Serialization {
                message: format!("pipeline lists stage '{}' but it has no output", entry.stage),
            }
        })?;
        result.record(StageOutput {
            stage_name: entry.stage,
            kind,
            raw_text,
            context_stage_names: entry.context,
        })?;
    }

    if !report.outputs.is_empty() {
        tracing::debug!(
            keys = ?report.outputs.keys().collect::<Vec<_>>(),
            "Ignoring JSON keys outside the pipeline"
        );
    }
    Ok(result)
}
