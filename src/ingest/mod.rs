//! Best-effort extraction of idea records from generated markdown
//!
//! This is a heuristic, not a grammar. Ideas are found by numbered header
//! lines and their sections by keyword labels; anything the heuristic does
//! not recognize is folded into the open section or dropped. Extraction never
//! fails: a document with no numbered ideas yields a single idea wrapping the
//! raw text, so a renderer always has something to lay out.

pub mod markdown;

pub use markdown::{Extraction, IdeaExtractor, extract};

/// Which idea field a section header opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Description,
    Implementation,
    Feasibility,
    Commercial,
    Impact,
    Pitch,
    Domain,
    Technologies,
}

/// Ordered keyword table mapping a header label to a section.
/// The first entry with a keyword contained in the lowercased label wins.
#[derive(Debug, Clone)]
pub struct SectionKeywords {
    entries: Vec<(SectionKind, Vec<String>)>,
}

impl SectionKeywords {
    pub fn new(entries: Vec<(SectionKind, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(kind, words)| {
                (
                    kind,
                    words.into_iter().map(|w| w.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn classify(&self, label: &str) -> Option<SectionKind> {
        let label = label.to_lowercase();
        self.entries
            .iter()
            .find(|(_, words)| words.iter().any(|w| label.contains(w.as_str())))
            .map(|(kind, _)| *kind)
    }
}

impl Default for SectionKeywords {
    fn default() -> Self {
        let table: [(SectionKind, &[&str]); 8] = [
            (
                SectionKind::Description,
                &["description", "what is it", "overview"],
            ),
            (
                SectionKind::Implementation,
                &["implementation", "how to build", "technical"],
            ),
            (
                SectionKind::Feasibility,
                &["feasibility", "difficulty", "resources"],
            ),
            // before impact so "market potential" is not read as impact
            (
                SectionKind::Commercial,
                &["commercial", "market", "business model"],
            ),
            (
                SectionKind::Impact,
                &["impact", "potential", "value", "outcome"],
            ),
            (SectionKind::Pitch, &["pitch", "summary", "tldr"]),
            (SectionKind::Domain, &["domain"]),
            (SectionKind::Technologies, &["technolog", "tech stack"]),
        ];
        Self::new(
            table
                .into_iter()
                .map(|(kind, words)| (kind, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let kw = SectionKeywords::default();
        assert_eq!(kw.classify("Description"), Some(SectionKind::Description));
        assert_eq!(kw.classify("How to Build"), Some(SectionKind::Implementation));
        assert_eq!(kw.classify("Potential Impact"), Some(SectionKind::Impact));
        assert_eq!(kw.classify("Market Potential"), Some(SectionKind::Commercial));
        assert_eq!(kw.classify("Elevator Pitch"), Some(SectionKind::Pitch));
        assert_eq!(kw.classify("AI Technologies"), Some(SectionKind::Technologies));
        assert_eq!(kw.classify("Domains"), Some(SectionKind::Domain));
        assert_eq!(kw.classify("Vibe Check"), None);
    }

    #[test]
    fn test_custom_table_replaces_defaults() {
        let kw = SectionKeywords::new(vec![(
            SectionKind::Description,
            vec!["The Weird Concept".to_string()],
        )]);
        assert_eq!(
            kw.classify("the weird concept"),
            Some(SectionKind::Description)
        );
        assert_eq!(kw.classify("Description"), None);
    }
}
