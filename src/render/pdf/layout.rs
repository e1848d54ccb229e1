//! Flowable layout into a page model of positioned text runs and rules
//!
//! Coordinates are PostScript points with the origin at the bottom-left of a
//! US Letter page. Lines are broken with the Helvetica advance widths from
//! [`metrics`](super::metrics).

use thiserror::Error;

use crate::render::pdf::metrics;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 54.0;
/// Height of the blank block that replaces text which cannot be laid out
pub const FAILED_BLOCK_SPACER: f32 = 5.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub indent: f32,
    pub centered: bool,
}

impl TextStyle {
    const fn new(face: FontFace, size: f32) -> Self {
        Self {
            face,
            size,
            leading: size * 1.3,
            space_before: 0.0,
            space_after: 6.0,
            indent: 0.0,
            centered: false,
        }
    }

    pub const fn title() -> Self {
        let mut s = Self::new(FontFace::Bold, 26.0);
        s.space_after = 24.0;
        s.centered = true;
        s
    }

    pub const fn subtitle() -> Self {
        let mut s = Self::new(FontFace::Regular, 16.0);
        s.space_after = 18.0;
        s.centered = true;
        s
    }

    pub const fn cover_meta() -> Self {
        let mut s = Self::new(FontFace::Italic, 11.0);
        s.centered = true;
        s
    }

    pub const fn heading() -> Self {
        let mut s = Self::new(FontFace::Bold, 16.0);
        s.space_before = 14.0;
        s.space_after = 8.0;
        s
    }

    pub const fn subheading() -> Self {
        let mut s = Self::new(FontFace::Bold, 12.0);
        s.space_before = 8.0;
        s.space_after = 4.0;
        s
    }

    pub const fn body() -> Self {
        Self::new(FontFace::Regular, 10.0)
    }

    pub const fn blurb() -> Self {
        let mut s = Self::new(FontFace::Italic, 10.0);
        s.space_after = 10.0;
        s
    }

    pub const fn pitch() -> Self {
        let mut s = Self::new(FontFace::Italic, 11.0);
        s.indent = 18.0;
        s.space_after = 10.0;
        s
    }

    pub const fn meta() -> Self {
        let mut s = Self::new(FontFace::Italic, 8.0);
        s.space_before = 4.0;
        s
    }

    /// Vertical space taken by `lines` lines of this style, margins included
    fn block_height(&self, lines: usize) -> f32 {
        self.space_before + self.leading * lines as f32 + self.space_after
    }
}

/// Something the layout engine can place
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph { text: String, style: TextStyle },
    Spacer(f32),
    /// Horizontal rule across the content width
    Rule,
    PageBreak,
    /// Cells are laid out left to right with the given column widths
    Table {
        rows: Vec<Vec<String>>,
        col_widths: Vec<f32>,
        style: TextStyle,
    },
    /// Moved to a fresh page as a unit when it does not fit on the current one
    KeepTogether(Vec<Flowable>),
}

impl Flowable {
    pub fn paragraph(text: impl Into<String>, style: TextStyle) -> Self {
        Flowable::Paragraph {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub size: f32,
    pub face: FontFace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
    pub rules: Vec<RuleLine>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() && self.rules.is_empty()
    }

    /// Text of every run, one per line, top to bottom
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageModel {
    pub pages: Vec<Page>,
    /// Blocks replaced by a spacer because they could not be laid out
    pub failed_blocks: usize,
}

impl PageModel {
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(Page::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.pages
            .iter()
            .flat_map(|p| p.runs.iter())
            .any(|r| r.text.contains(needle))
    }

    /// Index of the first page whose runs contain `needle`
    pub fn page_of(&self, needle: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.runs.iter().any(|r| r.text.contains(needle)))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("control character U+{0:04X} cannot be rendered")]
    ControlCharacter(u32),
}

/// Replace typographic characters the built-in fonts cannot encode.
/// Anything outside Latin-1 that has no ASCII stand-in becomes `?`.
/// Control characters are left alone so layout can reject them.
pub fn sanitize_for_pdf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' => out.push('*'),
            '\u{2192}' | '\u{27A1}' => out.push_str("->"),
            '\u{2190}' => out.push_str("<-"),
            '\u{21D2}' => out.push_str("=>"),
            '\u{00A0}' | '\u{2009}' | '\u{200A}' => out.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            '\t' => out.push_str("    "),
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// First character that layout refuses (controls other than newline,
/// carriage return and tab)
pub fn control_character(text: &str) -> Option<char> {
    text.chars()
        .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
}

fn text_width(text: &str, style: &TextStyle) -> f32 {
    metrics::text_width(style.face, style.size, text)
}

/// Greedy word wrap on measured glyph widths. Explicit newlines are kept; a
/// blank line stays blank. A word wider than the line is broken between
/// characters.
pub fn wrap(text: &str, style: &TextStyle, width: f32) -> Result<Vec<String>, LayoutError> {
    if let Some(c) = control_character(text) {
        return Err(LayoutError::ControlCharacter(c as u32));
    }
    // compare in font units to avoid float drift
    let max_units = ((width * 1000.0 / style.size).floor() as u32).max(1);
    let space = metrics::char_units(style.face, ' ');

    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        let mut line_units = 0u32;
        for word in raw.split_whitespace() {
            let mut word_units = metrics::text_units(style.face, word);
            let mut word = word.to_string();
            while word_units > max_units {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_units = 0;
                }
                let (head, head_units) = fitting_prefix(&word, style.face, max_units);
                let head = head.to_string();
                word = word[head.len()..].to_string();
                word_units -= head_units;
                lines.push(head);
            }
            if !line.is_empty() && line_units + space + word_units > max_units {
                lines.push(std::mem::take(&mut line));
                line_units = 0;
            }
            if !line.is_empty() {
                line.push(' ');
                line_units += space;
            }
            line.push_str(&word);
            line_units += word_units;
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Longest prefix of `word` within `max_units`, never empty
fn fitting_prefix(word: &str, face: FontFace, max_units: u32) -> (&str, u32) {
    let mut used = 0u32;
    let mut end = 0usize;
    for (idx, c) in word.char_indices() {
        let w = metrics::char_units(face, c);
        if end > 0 && used + w > max_units {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    (&word[..end], used)
}

/// Lay out flowables top to bottom, breaking pages as needed
pub fn layout(flowables: &[Flowable]) -> PageModel {
    let mut engine = Engine::new();
    for flowable in flowables {
        engine.place(flowable);
    }
    engine.finish()
}

struct Engine {
    pages: Vec<Page>,
    y: f32,
    failed_blocks: usize,
}

impl Engine {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN,
            failed_blocks: 0,
        }
    }

    fn finish(self) -> PageModel {
        PageModel {
            pages: self.pages,
            failed_blocks: self.failed_blocks,
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn new_page(&mut self) {
        if self.pages.last().is_some_and(Page::is_empty) {
            self.y = PAGE_HEIGHT - MARGIN;
            return;
        }
        self.pages.push(Page::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.at_top() {
            self.new_page();
        }
    }

    fn place(&mut self, flowable: &Flowable) {
        match flowable {
            Flowable::Paragraph { text, style } => self.paragraph(text, style),
            Flowable::Spacer(height) => self.spacer(*height),
            Flowable::Rule => {
                self.ensure(8.0);
                self.y -= 4.0;
                let y = self.y;
                self.page().rules.push(RuleLine {
                    x1: MARGIN,
                    y1: y,
                    x2: PAGE_WIDTH - MARGIN,
                    y2: y,
                });
                self.y -= 4.0;
            }
            Flowable::PageBreak => self.new_page(),
            Flowable::Table {
                rows,
                col_widths,
                style,
            } => self.table(rows, col_widths, style),
            Flowable::KeepTogether(children) => {
                let height: f32 = children.iter().map(measure).sum();
                if height <= PAGE_HEIGHT - 2.0 * MARGIN {
                    self.ensure(height);
                }
                for child in children {
                    self.place(child);
                }
            }
        }
    }

    fn spacer(&mut self, height: f32) {
        if height >= self.remaining() {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    fn paragraph(&mut self, text: &str, style: &TextStyle) {
        let width = CONTENT_WIDTH - style.indent;
        let lines = match wrap(text, style, width) {
            Ok(lines) => lines,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping block that cannot be laid out");
                self.failed_blocks += 1;
                self.spacer(FAILED_BLOCK_SPACER);
                return;
            }
        };

        if !self.at_top() {
            self.y -= style.space_before;
        }
        for line in lines {
            self.ensure(style.leading);
            let baseline = self.y - style.size;
            let x = if style.centered {
                ((PAGE_WIDTH - text_width(&line, style)) / 2.0).max(MARGIN)
            } else {
                MARGIN + style.indent
            };
            if !line.is_empty() {
                self.page().runs.push(TextRun {
                    text: line,
                    x,
                    y: baseline,
                    size: style.size,
                    face: style.face,
                });
            }
            self.y -= style.leading;
        }
        self.y -= style.space_after;
    }

    fn table(&mut self, rows: &[Vec<String>], col_widths: &[f32], style: &TextStyle) {
        let row_height = style.size * 1.8;
        let total_width: f32 = col_widths.iter().sum();
        self.ensure(row_height * rows.len() as f32);
        let top = self.y;
        self.page().rules.push(RuleLine {
            x1: MARGIN,
            y1: top,
            x2: MARGIN + total_width,
            y2: top,
        });
        for row in rows {
            self.ensure(row_height);
            let baseline = self.y - row_height + (row_height - style.size) / 2.0 + 1.0;
            let mut x = MARGIN;
            for (col, (cell, width)) in row.iter().zip(col_widths).enumerate() {
                let face = if col == 0 { FontFace::Bold } else { style.face };
                if !cell.is_empty() {
                    self.page().runs.push(TextRun {
                        text: cell.clone(),
                        x: x + 4.0,
                        y: baseline,
                        size: style.size,
                        face,
                    });
                }
                x += width;
            }
            self.y -= row_height;
            let y = self.y;
            self.page().rules.push(RuleLine {
                x1: MARGIN,
                y1: y,
                x2: MARGIN + total_width,
                y2: y,
            });
        }
        self.y -= style.space_after;
    }
}

/// Height a flowable would take on an empty page
fn measure(flowable: &Flowable) -> f32 {
    match flowable {
        Flowable::Paragraph { text, style } => {
            match wrap(text, style, CONTENT_WIDTH - style.indent) {
                Ok(lines) => style.block_height(lines.len()),
                Err(_) => FAILED_BLOCK_SPACER,
            }
        }
        Flowable::Spacer(h) => *h,
        Flowable::Rule => 8.0,
        Flowable::PageBreak => 0.0,
        Flowable::Table { rows, style, .. } => {
            style.size * 1.8 * rows.len() as f32 + style.space_after
        }
        Flowable::KeepTogether(children) => children.iter().map(measure).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let style = TextStyle::body();
        let lines = wrap("alpha beta gamma delta epsilon zeta", &style, 100.0).unwrap();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, &style) <= 100.0));
        assert_eq!(lines.join(" "), "alpha beta gamma delta epsilon zeta");
    }

    #[test]
    fn test_wide_glyphs_stay_inside_margins() {
        let model = layout(&[
            Flowable::paragraph("W".repeat(100), TextStyle::body()),
            Flowable::paragraph("MAXIMUM CHAOS ".repeat(8), TextStyle::heading()),
            Flowable::paragraph("WIDE ".repeat(40), TextStyle::title()),
            Flowable::paragraph("mmmm ".repeat(60), TextStyle::pitch()),
        ]);
        let runs: Vec<&TextRun> = model.pages.iter().flat_map(|p| p.runs.iter()).collect();
        assert!(runs.len() > 4);
        for run in runs {
            let right = run.x + metrics::text_width(run.face, run.size, &run.text);
            assert!(right <= PAGE_WIDTH - MARGIN + 0.01, "{} ends at {right}", run.text);
            assert!(run.x >= MARGIN);
        }
        assert!(model.contains("MAXIMUM CHAOS MAXIMUM"));
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines() {
        let lines = wrap("one\n\ntwo", &TextStyle::body(), 500.0).unwrap();
        assert_eq!(lines, ["one", "", "two"]);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        // x is 500 units, so 5pt at 10pt: twenty to a 100pt line
        let lines = wrap(&"x".repeat(45), &TextStyle::body(), 100.0).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 20);
        assert_eq!(lines[2].len(), 5);
    }

    #[test]
    fn test_control_characters_rejected() {
        assert_eq!(
            wrap("bell\u{7}", &TextStyle::body(), 100.0),
            Err(LayoutError::ControlCharacter(7))
        );
    }

    #[test]
    fn test_failed_block_becomes_spacer() {
        let model = layout(&[
            Flowable::paragraph("before", TextStyle::body()),
            Flowable::paragraph("bad \u{1b}[31m", TextStyle::body()),
            Flowable::paragraph("after", TextStyle::body()),
        ]);
        assert_eq!(model.failed_blocks, 1);
        assert!(model.contains("before"));
        assert!(model.contains("after"));
        assert!(!model.contains("bad"));
    }

    #[test]
    fn test_long_text_breaks_pages() {
        let text = "word ".repeat(6000);
        let model = layout(&[Flowable::paragraph(text, TextStyle::body())]);
        assert!(model.pages.len() > 1);
        for page in &model.pages {
            assert!(page.runs.iter().all(|r| r.y >= MARGIN - 1.0));
        }
    }

    #[test]
    fn test_page_break_and_keep_together() {
        let filler: Vec<Flowable> = (0..34)
            .map(|i| Flowable::paragraph(format!("filler {i}"), TextStyle::body()))
            .collect();
        let mut flowables = filler;
        flowables.push(Flowable::KeepTogether(vec![
            Flowable::paragraph("kept heading", TextStyle::heading()),
            Flowable::paragraph("kept body ".repeat(80), TextStyle::body()),
        ]));
        let model = layout(&flowables);
        let heading_page = model.page_of("kept heading").unwrap();
        let last_body_page = model
            .pages
            .iter()
            .rposition(|p| p.runs.iter().any(|r| r.text.contains("kept body")))
            .unwrap();
        assert_eq!(heading_page, 1);
        assert_eq!(heading_page, last_body_page);

        let model = layout(&[
            Flowable::paragraph("cover", TextStyle::title()),
            Flowable::PageBreak,
            Flowable::paragraph("contents", TextStyle::heading()),
        ]);
        assert_eq!(model.page_of("cover"), Some(0));
        assert_eq!(model.page_of("contents"), Some(1));
    }

    #[test]
    fn test_sanitize_transliterates() {
        assert_eq!(
            sanitize_for_pdf("\u{201C}Hi\u{201D} \u{2014} a\u{2192}b\u{2026} \u{1F916}"),
            "\"Hi\" - a->b... ?"
        );
        assert_eq!(sanitize_for_pdf("caf\u{e9}"), "caf\u{e9}");
        assert_eq!(sanitize_for_pdf("keep\u{7}"), "keep\u{7}");
    }

    #[test]
    fn test_table_rows_positioned() {
        let model = layout(&[Flowable::Table {
            rows: vec![
                vec!["Creativity".into(), "8/10".into()],
                vec!["Overall".into(), "7.5/10".into()],
            ],
            col_widths: vec![120.0, 80.0],
            style: TextStyle::body(),
        }]);
        let page = &model.pages[0];
        assert_eq!(page.rules.len(), 3);
        let overall = page.runs.iter().find(|r| r.text == "7.5/10").unwrap();
        assert_eq!(overall.x, MARGIN + 124.0);
    }
}
