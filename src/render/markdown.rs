use std::fmt::Write;

use crate::pipeline::IdeationResult;
use crate::render::{REPORT_TITLE, describe_run, stage_blurb, stage_title};

/// Full run as one markdown document, stages in execution order
pub fn render_markdown(result: &IdeationResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "# {} - Complete Ideation Run\n", REPORT_TITLE);
    let _ = writeln!(
        out,
        "**Generated:** {}  ",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "**Model:** {}  ", result.model);
    let _ = writeln!(out, "**Pipeline:** {}\n", describe_run(result));
    out.push_str("---\n\n");

    for (idx, output) in result.outputs().iter().enumerate() {
        let _ = writeln!(out, "## Part {}: {}\n", idx + 1, stage_title(output));
        let _ = writeln!(out, "*{}*\n", stage_blurb(output.kind));
        let text = output.raw_text.trim();
        if text.is_empty() {
            out.push_str("*No output captured*\n\n");
        } else {
            let _ = writeln!(out, "{}\n", text);
        }
        out.push_str("---\n\n");
    }
    out
}
