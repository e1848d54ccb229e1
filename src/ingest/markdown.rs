//! Line-oriented state machine that turns numbered markdown into ideas
//!
//! States: `SeekingHeader` until the first numbered header, then
//! `InIdea { section, in_steps }` where `section` is the field currently
//! collecting lines (none between the title and the first recognized section
//! header).
//!
//! Inside an open section a bare numbered line is a step of that section, not
//! a new idea, when it is indented or does not advance past the current idea
//! number. Once a step list starts, bare numbered lines stay steps until a
//! blank line. Headers with `#`, `**` or an `Idea`/`Concept` prefix always
//! start a new idea.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::{SectionKeywords, SectionKind};
use crate::models::{Evaluation, Idea, MAX_PITCH_CHARS, Scores, truncate_chars};

/// Characters of raw text kept by the single fallback idea
pub const FALLBACK_DESCRIPTION_CHARS: usize = 5000;

static IDEA_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,4}\s*)?(?:\*\*)?(?:(?:idea|concept)\s+)?(\d{1,4})\s*[:.)]\s+(.+)$")
        .expect("idea header regex")
});

static SCORE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[\s\-*#+]*(creativity|feasibility|uniqueness|impact)(?:\s+score)?(?:\s*\(1\s*-\s*10\))?[\s*]*[:=\-][\s*]*(\d{1,2})(?:\s*/\s*10)?[\s*.]*$",
    )
    .expect("score line regex")
});

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").expect("sentence regex"));

/// Ideas plus any evaluations found inline (ideas with all four score lines)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub ideas: Vec<Idea>,
    pub evaluations: Vec<Evaluation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    SeekingHeader,
    InIdea {
        section: Option<SectionKind>,
        in_steps: bool,
    },
}

/// Extract with the default keyword table
pub fn extract(markdown: &str) -> Vec<Idea> {
    IdeaExtractor::default().extract(markdown)
}

#[derive(Debug, Clone, Default)]
pub struct IdeaExtractor {
    keywords: SectionKeywords,
}

impl IdeaExtractor {
    pub fn new(keywords: SectionKeywords) -> Self {
        Self { keywords }
    }

    pub fn extract(&self, markdown: &str) -> Vec<Idea> {
        self.extract_with_evaluations(markdown).ideas
    }

    pub fn extract_with_evaluations(&self, markdown: &str) -> Extraction {
        let mut state = State::SeekingHeader;
        let mut current: Option<IdeaBuilder> = None;
        let mut out = Extraction::default();

        for line in markdown.lines() {
            if let Some((id, title)) = parse_idea_header(line) {
                let current_id = current.as_ref().map(|b| b.id);
                if is_section_step(state, line, id, current_id) {
                    if let State::InIdea { section, .. } = state {
                        state = State::InIdea {
                            section,
                            in_steps: true,
                        };
                    }
                } else {
                    if let Some(done) = current.take() {
                        done.finish(&mut out);
                    }
                    let id = id.unwrap_or(out.ideas.len() as u32 + 1);
                    current = Some(IdeaBuilder::new(id, title));
                    state = State::InIdea {
                        section: None,
                        in_steps: false,
                    };
                    continue;
                }
            } else if line.trim().is_empty()
                && let State::InIdea { section, .. } = state
            {
                state = State::InIdea {
                    section,
                    in_steps: false,
                };
            }

            let State::InIdea { section, .. } = state else {
                continue;
            };
            let Some(builder) = current.as_mut() else {
                continue;
            };
            builder.body.push(line.to_string());

            if let Some((criterion, value)) = parse_score_line(line) {
                builder.scores.insert(criterion, value);
                continue;
            }

            if let Some((label, rest)) = split_label(line) {
                if label.to_lowercase().contains("justification") {
                    builder.justification.push_str(rest.trim());
                    state = State::InIdea {
                        section: None,
                        in_steps: false,
                    };
                    continue;
                }
                if let Some(kind) = self.keywords.classify(&label) {
                    if !rest.trim().is_empty() {
                        builder.push(kind, rest.trim());
                    }
                    state = State::InIdea {
                        section: Some(kind),
                        in_steps: false,
                    };
                    continue;
                }
            }

            if let Some(kind) = section {
                builder.push(kind, line);
            }
        }

        if let Some(done) = current.take() {
            done.finish(&mut out);
        }

        if out.ideas.is_empty() {
            out.ideas.push(fallback_idea(markdown));
        }
        out
    }
}

/// `N. Title`, `N: Title`, `N) Title`, `### N. Title`, `## Idea N: Title`
fn parse_idea_header(line: &str) -> Option<(Option<u32>, String)> {
    let caps = IDEA_HEADER_RE.captures(line)?;
    let id = caps[1].parse::<u32>().ok();
    let title = clean_title(&caps[2]);
    let title = if title.is_empty() {
        "Untitled Idea".to_string()
    } else {
        title
    };
    Some((id, title))
}

/// Whether a header-shaped line belongs to the open section instead of
/// starting a new idea
fn is_section_step(state: State, line: &str, id: Option<u32>, current_id: Option<u32>) -> bool {
    let State::InIdea {
        section: Some(_),
        in_steps,
    } = state
    else {
        return false;
    };
    let trimmed = line.trim_start();
    let lower = trimmed.to_lowercase();
    let decorated = trimmed.starts_with(['#', '*'])
        || lower.starts_with("idea")
        || lower.starts_with("concept");
    if decorated {
        return false;
    }
    let indented = trimmed.len() < line.len();
    let no_advance = matches!((id, current_id), (Some(n), Some(cur)) if n <= cur);
    in_steps || indented || no_advance
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '#' || c.is_whitespace())
        .trim_end_matches(':')
        .trim()
        .to_string()
}

fn parse_score_line(line: &str) -> Option<(String, u8)> {
    let caps = SCORE_LINE_RE.captures(line)?;
    let value = caps[2].parse::<u8>().ok().filter(|v| (1..=10).contains(v))?;
    Some((caps[1].to_lowercase(), value))
}

/// Split a candidate section header into `(label, rest of line)`.
///
/// Recognized shapes: `**Label**: text`, `**Label:** text`, `Label: text`
/// (short labels only) and whole heading lines (`### Label`).
fn split_label(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    let is_heading = trimmed.starts_with('#');
    let mut s = trimmed.trim_start_matches('#').trim();
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            s = rest.trim_start();
            break;
        }
    }

    if let Some(inner) = s.strip_prefix("**") {
        let close = inner.find("**")?;
        let label = inner[..close].trim().trim_end_matches(':').to_string();
        let rest = inner[close + 2..]
            .trim_start()
            .trim_start_matches([':', '-'])
            .to_string();
        return (!label.is_empty()).then_some((label, rest));
    }

    if let Some((label, rest)) = s.split_once(':') {
        let label = label.trim();
        let short = !label.is_empty()
            && label.chars().count() <= 40
            && label.split_whitespace().count() <= 5;
        if short {
            return Some((label.replace('*', ""), rest.to_string()));
        }
    }

    if is_heading && !s.is_empty() {
        return Some((s.replace('*', ""), String::new()));
    }
    None
}

/// First sentence with its delimiter removed
fn first_sentence(text: &str) -> &str {
    SENTENCE_END_RE
        .split(text)
        .next()
        .unwrap_or_default()
        .trim()
}

fn split_list(text: &str) -> BTreeSet<String> {
    text.split([',', ';', '\n'])
        .map(|item| {
            item.trim()
                .trim_start_matches(['-', '*', '+'])
                .trim()
                .trim_matches('*')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn fallback_idea(markdown: &str) -> Idea {
    tracing::warn!("No numbered ideas found; wrapping raw text in a single idea");
    let mut idea = Idea::new(1, "Ideation Report", "Full ideation session output");
    idea.description = truncate_chars(markdown, FALLBACK_DESCRIPTION_CHARS);
    idea
}

struct IdeaBuilder {
    id: u32,
    title: String,
    sections: HashMap<SectionKind, Vec<String>>,
    /// Every line after the title, for the description fallback
    body: Vec<String>,
    scores: HashMap<String, u8>,
    justification: String,
}

impl IdeaBuilder {
    fn new(id: u32, title: String) -> Self {
        Self {
            id,
            title,
            sections: HashMap::new(),
            body: Vec::new(),
            scores: HashMap::new(),
            justification: String::new(),
        }
    }

    fn push(&mut self, kind: SectionKind, line: &str) {
        self.sections
            .entry(kind)
            .or_default()
            .push(line.to_string());
    }

    fn section(&self, kind: SectionKind) -> String {
        self.sections
            .get(&kind)
            .map(|lines| lines.join("\n").trim().to_string())
            .unwrap_or_default()
    }

    fn finish(self, out: &mut Extraction) {
        let description = self.section(SectionKind::Description);

        let mut pitch = self.section(SectionKind::Pitch);
        if pitch.is_empty() && !description.is_empty() {
            pitch = first_sentence(&description).to_string();
        }
        if pitch.is_empty() {
            pitch = format!("AI experiment idea: {}", self.title);
        }

        let commercial = self.section(SectionKind::Commercial);

        let mut idea = Idea::new(self.id, self.title.clone(), truncate_chars(&pitch, MAX_PITCH_CHARS));
        idea.description = if description.is_empty() {
            self.body.join("\n").trim().to_string()
        } else {
            description
        };
        idea.implementation = self.section(SectionKind::Implementation);
        idea.feasibility = self.section(SectionKind::Feasibility);
        idea.potential_impact = self.section(SectionKind::Impact);
        idea.commercial_viability = (!commercial.is_empty()).then_some(commercial);
        idea.domain = split_list(&self.section(SectionKind::Domain));
        idea.ai_technologies = split_list(&self.section(SectionKind::Technologies));

        let score = |name: &str| self.scores.get(name).copied();
        if let (Some(c), Some(f), Some(u), Some(i)) = (
            score("creativity"),
            score("feasibility"),
            score("uniqueness"),
            score("impact"),
        ) && let Ok(scores) = Scores::new(c, f, u, i)
        {
            out.evaluations
                .push(Evaluation::new(self.id, scores, self.justification.clone()));
        }

        out.ideas.push(idea);
    }
}
