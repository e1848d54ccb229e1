//! Markdown to plain text blocks for PDF layout
//!
//! Inline markup (emphasis, links, code spans) is reduced to its text. List
//! items keep a `- ` or `N. ` marker since the PDF has no list rendering of
//! its own.

use std::ops::Range;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    /// List item at the given nesting depth, starting at 1
    Item(usize),
    Code,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    /// Byte range of the block in the source
    pub source: Range<usize>,
}

struct BlockBuilder {
    blocks: Vec<Block>,
    pending: Option<(BlockKind, Range<usize>)>,
    buf: String,
    /// Next number of each open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
}

impl BlockBuilder {
    fn open(&mut self, kind: BlockKind, range: Range<usize>) {
        self.flush();
        self.pending = Some((kind, range));
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.buf);
        let Some((kind, source)) = self.pending.take() else {
            return;
        };
        let text = text.trim_end().to_string();
        let blank = match kind {
            BlockKind::Rule => false,
            // marker only
            BlockKind::Item(_) => text
                .trim_end_matches(['-', '.', ' '])
                .chars()
                .all(|c| c.is_ascii_digit()),
            _ => text.trim().is_empty(),
        };
        if !blank {
            self.blocks.push(Block { kind, text, source });
        }
    }

    fn push_text(&mut self, text: &str, range: Range<usize>) {
        if self.pending.is_none() {
            self.pending = Some((BlockKind::Paragraph, range));
        }
        self.buf.push_str(text);
    }
}

/// Split markdown into text blocks in document order
pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut b = BlockBuilder {
        blocks: Vec::new(),
        pending: None,
        buf: String::new(),
        lists: Vec::new(),
    };

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                b.open(BlockKind::Heading(level as u8), range)
            }
            Event::Start(Tag::Paragraph) => {
                if b.pending.is_none() {
                    b.pending = Some((BlockKind::Paragraph, range));
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if matches!(b.pending, Some((BlockKind::Paragraph, _))) {
                    b.flush();
                } else {
                    // loose list item with several paragraphs
                    b.buf.push('\n');
                }
            }
            Event::Start(Tag::List(start)) => {
                b.flush();
                b.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                b.flush();
                b.lists.pop();
            }
            Event::Start(Tag::Item) => {
                let depth = b.lists.len().max(1);
                let marker = match b.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                b.open(BlockKind::Item(depth), range);
                b.buf.push_str(&marker);
            }
            Event::Start(Tag::CodeBlock(_)) => b.open(BlockKind::Code, range),
            Event::End(
                TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock | TagEnd::HtmlBlock,
            ) => b.flush(),
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                b.push_text(&text, range)
            }
            Event::SoftBreak | Event::HardBreak => b.buf.push('\n'),
            Event::Rule => {
                b.open(BlockKind::Rule, range);
                b.flush();
            }
            _ => {}
        }
    }
    b.flush();
    b.blocks
}

/// Markdown reduced to plain text, one block per line
pub fn plain_text(markdown: &str) -> String {
    blocks(markdown)
        .into_iter()
        .filter(|block| block.kind != BlockKind::Rule)
        .map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n")
}
