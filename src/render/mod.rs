//! Report rendering: markdown and JSON for a full run, PDF for runs and for
//! extracted ideas.

pub mod json;
pub mod markdown;
pub mod pdf;

pub use json::{parse_json, render_json};
pub use markdown::render_markdown;
pub use pdf::{IdeasReport, render_ideas_pdf, render_run_pdf};

use crate::pipeline::{IdeationResult, StageKind, StageOutput};

pub const REPORT_TITLE: &str = "Weird AI Experiments";

/// Section title used for a stage in run reports
pub fn stage_title(output: &StageOutput) -> String {
    let title = match output.kind {
        StageKind::Generation => "Initial Weird Ideas Generation",
        StageKind::Amplification1 => "First Weirdness Amplification (Blinded)",
        StageKind::Amplification2 => "Second Amplification - MAXIMUM CHAOS",
        StageKind::Evaluation => "Evaluation",
        StageKind::Categorization => "Categorization",
        StageKind::Synthesis => "Final Synthesis",
    };
    if output.stage_name == output.kind.default_stage_name() {
        title.to_string()
    } else {
        format!("{} ({})", title, output.stage_name)
    }
}

/// One-line italic introduction printed under each stage title
pub fn stage_blurb(kind: StageKind) -> &'static str {
    match kind {
        StageKind::Generation => {
            "The mad scientist generates the initial batch of weird ideas, pushing boundaries from the start."
        }
        StageKind::Amplification1 => {
            "The first amplifier thinks these are rough drafts and tries to make them weirder, bolder and more unexpected."
        }
        StageKind::Amplification2 => {
            "The second amplifier ALSO thinks these are just preliminary ideas and cranks them to 11."
        }
        StageKind::Evaluation => {
            "Assessing all versions across creativity, feasibility, uniqueness, and impact."
        }
        StageKind::Categorization => {
            "Organizing the chaos into meaningful categories and themes."
        }
        StageKind::Synthesis => "Bringing it all together into actionable insights.",
    }
}

/// `Generator -> Amplifier #1 -> Amplifier #2 (blinded) -> ...` for a recorded run
pub fn describe_run(result: &IdeationResult) -> String {
    result
        .outputs()
        .iter()
        .enumerate()
        .map(|(idx, o)| {
            if o.context_stage_names.len() < idx {
                format!("{} (blinded)", o.kind.agent_label())
            } else {
                o.kind.agent_label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
