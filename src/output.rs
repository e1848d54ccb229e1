//! Writes the three artifacts of a finished run under the output root

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use crate::error::Result;
use crate::pipeline::IdeationResult;
use crate::render::{render_json, render_markdown, render_run_pdf};

/// Filename timestamp, local time
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq)]
pub struct RunArtifacts {
    pub markdown: PathBuf,
    pub json: PathBuf,
    pub pdf: PathBuf,
}

pub fn run_stamp(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(STAMP_FORMAT).to_string()
}

pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render and write markdown, JSON and PDF, all named after the run's
    /// start time. Rendering happens before any file is created.
    pub fn write_run(&self, result: &IdeationResult) -> Result<RunArtifacts> {
        let stamp = run_stamp(result.timestamp);

        let markdown = render_markdown(result);
        let json = serde_json::to_string_pretty(&render_json(result)?)?;
        let pdf = render_run_pdf(result)?;

        let artifacts = RunArtifacts {
            markdown: self
                .root
                .join("markdown")
                .join(format!("ideation_report_{stamp}.md")),
            json: self.root.join("json").join(format!("ideation_{stamp}.json")),
            pdf: self
                .root
                .join("pdf")
                .join(format!("ideation_report_{stamp}.pdf")),
        };

        write_file(&artifacts.markdown, markdown.as_bytes())?;
        write_file(&artifacts.json, json.as_bytes())?;
        write_file(&artifacts.pdf, &pdf)?;

        tracing::info!(
            markdown = %artifacts.markdown.display(),
            json = %artifacts.json.display(),
            pdf = %artifacts.pdf.display(),
            "Wrote run artifacts"
        );
        Ok(artifacts)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
