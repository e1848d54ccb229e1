use chrono::Local;

use crate::pipeline::IdeationResult;
use crate::render::pdf::layout::{Flowable, PageModel, TextStyle, control_character, layout};
use crate::render::pdf::markdown::{BlockKind, blocks};
use crate::render::pdf::{GENERATED_FORMAT, plain_block, text_block};
use crate::render::{REPORT_TITLE, describe_run, stage_blurb, stage_title};

/// Lay out a full run: cover, contents, then one section per stage
pub fn run_layout(result: &IdeationResult) -> PageModel {
    let mut flow = vec![
        text_block(REPORT_TITLE, TextStyle::title()),
        text_block("Complete Ideation Run", TextStyle::subtitle()),
        text_block(
            &format!(
                "Generated: {}",
                result
                    .timestamp
                    .with_timezone(&Local)
                    .format(GENERATED_FORMAT)
            ),
            TextStyle::cover_meta(),
        ),
        text_block(&format!("Model: {}", result.model), TextStyle::cover_meta()),
        text_block(
            &format!("Pipeline: {}", describe_run(result)),
            TextStyle::cover_meta(),
        ),
        Flowable::PageBreak,
        text_block("Contents", TextStyle::heading()),
    ];

    for (idx, output) in result.outputs().iter().enumerate() {
        flow.push(text_block(
            &format!("Part {}: {}", idx + 1, stage_title(output)),
            TextStyle::body(),
        ));
    }

    for (idx, output) in result.outputs().iter().enumerate() {
        flow.push(Flowable::PageBreak);
        flow.push(text_block(
            &format!("Part {}: {}", idx + 1, stage_title(output)),
            TextStyle::heading(),
        ));
        flow.push(text_block(stage_blurb(output.kind), TextStyle::blurb()));

        if output.raw_text.trim().is_empty() {
            flow.push(text_block("No output captured", TextStyle::blurb()));
            continue;
        }
        flow.extend(body_blocks(&output.raw_text));
    }

    layout(&flow)
}

/// Stage text as flowables: `#` headings become headings, deeper levels
/// subheadings, list items are indented by depth. A block holding a
/// character layout cannot take is handed over raw so it fails on its own.
fn body_blocks(text: &str) -> Vec<Flowable> {
    blocks(text)
        .into_iter()
        .map(|block| {
            let style = match block.kind {
                BlockKind::Rule => return Flowable::Rule,
                BlockKind::Heading(1) => TextStyle::heading(),
                BlockKind::Heading(_) => TextStyle::subheading(),
                BlockKind::Item(depth) => {
                    let mut style = TextStyle::body();
                    style.indent = 12.0 * depth as f32;
                    style.space_after = 2.0;
                    style
                }
                BlockKind::Paragraph | BlockKind::Code => TextStyle::body(),
            };
            let source = &text[block.source];
            if control_character(source).is_some() {
                Flowable::paragraph(source, style)
            } else {
                plain_block(&block.text, style)
            }
        })
        .collect()
}
