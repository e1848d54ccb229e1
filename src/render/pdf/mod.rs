//! PDF reports
//!
//! Documents are assembled as flowables, laid out into a [`PageModel`] and
//! only then emitted with `printpdf`. The page model is what tests inspect.

mod ideas;
pub mod layout;
pub mod markdown;
mod metrics;
mod run;
mod writer;

pub use ideas::{IdeasReport, ideas_layout};
pub use layout::{Flowable, PageModel, TextStyle, sanitize_for_pdf};
pub use run::run_layout;

use crate::error::Result;
use crate::pipeline::IdeationResult;
use layout::control_character;

/// Timestamp format printed on cover pages
pub const GENERATED_FORMAT: &str = "%B %d, %Y at %I:%M %p";

pub fn render_ideas_pdf(report: &IdeasReport) -> Result<Vec<u8>> {
    writer::write_pdf("Weird AI Experiments - Ideation Report", &ideas_layout(report))
}

pub fn render_run_pdf(result: &IdeationResult) -> Result<Vec<u8>> {
    writer::write_pdf("Weird AI Experiments - Complete Ideation Run", &run_layout(result))
}

/// Paragraph with markdown reduced to plain text and made encodable.
/// Text that layout would reject is passed through as is, so it fails there.
fn text_block(text: &str, style: TextStyle) -> Flowable {
    if control_character(text).is_some() {
        return Flowable::paragraph(text, style);
    }
    plain_block(&markdown::plain_text(text), style)
}

/// Paragraph of text that is already plain
fn plain_block(text: &str, style: TextStyle) -> Flowable {
    Flowable::paragraph(sanitize_for_pdf(text), style)
}
