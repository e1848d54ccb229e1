use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::ingest::Extraction;
use crate::models::{Category, Evaluation, Idea, IdeationSession};
use crate::render::REPORT_TITLE;
use crate::render::pdf::layout::{Flowable, PageModel, TextStyle, layout};
use crate::render::pdf::{GENERATED_FORMAT, text_block};

/// Input of the per-idea PDF
#[derive(Debug, Clone)]
pub struct IdeasReport {
    pub ideas: Vec<Idea>,
    pub evaluations: Vec<Evaluation>,
    pub categories: Vec<Category>,
    /// Only render the N best ideas
    pub top: Option<usize>,
    pub generated: DateTime<Local>,
}

impl IdeasReport {
    pub fn new(ideas: Vec<Idea>) -> Self {
        Self {
            ideas,
            evaluations: Vec::new(),
            categories: Vec::new(),
            top: None,
            generated: Local::now(),
        }
    }

    pub fn from_extraction(extraction: Extraction) -> Self {
        Self {
            evaluations: extraction.evaluations,
            ..Self::new(extraction.ideas)
        }
    }

    pub fn from_session(session: IdeationSession) -> Self {
        Self {
            evaluations: session.evaluations,
            categories: session.categories,
            ..Self::new(session.ideas)
        }
    }

    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }

    /// Ideas in presentation order: by descending overall score when any
    /// evaluation exists (unscored ideas last), otherwise as given.
    pub fn ranked(&self) -> Vec<(&Idea, Option<&Evaluation>)> {
        let by_id: HashMap<u32, &Evaluation> =
            self.evaluations.iter().map(|e| (e.idea_id, e)).collect();
        let mut ranked: Vec<_> = self
            .ideas
            .iter()
            .map(|idea| (idea, by_id.get(&idea.id).copied()))
            .collect();
        if !by_id.is_empty() {
            ranked.sort_by(|(_, a), (_, b)| match (a, b) {
                (Some(a), Some(b)) => b
                    .overall_score
                    .partial_cmp(&a.overall_score)
                    .unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }
        if let Some(top) = self.top {
            ranked.truncate(top);
        }
        ranked
    }
}

/// Lay out the per-idea report
pub fn ideas_layout(report: &IdeasReport) -> PageModel {
    let ranked = report.ranked();
    let has_scores = !report.evaluations.is_empty();
    let mut flow = Vec::new();

    flow.push(text_block(REPORT_TITLE, TextStyle::title()));
    flow.push(text_block("Ideation Report", TextStyle::subtitle()));
    flow.push(text_block(
        &format!("{} Creative AI Experiment Ideas", ranked.len()),
        TextStyle::subtitle(),
    ));
    flow.push(text_block(
        &format!("Generated: {}", report.generated.format(GENERATED_FORMAT)),
        TextStyle::cover_meta(),
    ));
    flow.push(Flowable::PageBreak);

    if let Some(top) = report.top {
        flow.push(text_block(&format!("Top {} Ideas", top), TextStyle::heading()));
        flow.push(Flowable::Rule);
    }

    for (rank, (idea, evaluation)) in ranked.iter().enumerate() {
        flow.extend(idea_block(rank + 1, idea, *evaluation, has_scores));
    }

    if !report.categories.is_empty() {
        flow.push(Flowable::PageBreak);
        flow.push(text_block("Categories", TextStyle::heading()));
        for category in &report.categories {
            flow.extend(category_block(category));
        }
    }

    layout(&flow)
}

fn idea_block(
    rank: usize,
    idea: &Idea,
    evaluation: Option<&Evaluation>,
    has_scores: bool,
) -> Vec<Flowable> {
    let heading = if has_scores {
        format!("#{}: {}", rank, idea.title)
    } else {
        format!("{}. {}", idea.id, idea.title)
    };

    let mut head = vec![
        text_block(&heading, TextStyle::heading()),
        text_block(&format!("\"{}\"", idea.elevator_pitch), TextStyle::pitch()),
    ];
    if let Some(eval) = evaluation {
        head.push(score_table(eval));
    }

    let mut flow = vec![Flowable::KeepTogether(head)];

    let sections = [
        ("Description", Some(idea.description.as_str())),
        ("Implementation", Some(idea.implementation.as_str())),
        ("Feasibility", Some(idea.feasibility.as_str())),
        ("Potential Impact", Some(idea.potential_impact.as_str())),
        ("Commercial Viability", idea.commercial_viability.as_deref()),
    ];
    for (label, text) in sections {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        flow.push(text_block(label, TextStyle::subheading()));
        flow.push(text_block(text, TextStyle::body()));
    }

    if let Some(eval) = evaluation
        && !eval.justification.trim().is_empty()
    {
        flow.push(text_block("Evaluation Notes", TextStyle::subheading()));
        flow.push(text_block(&eval.justification, TextStyle::body()));
    }

    let mut meta = Vec::new();
    if !idea.domain.is_empty() {
        meta.push(format!(
            "Domains: {}",
            idea.domain.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !idea.ai_technologies.is_empty() {
        meta.push(format!(
            "Technologies: {}",
            idea.ai_technologies
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !meta.is_empty() {
        flow.push(text_block(&meta.join(" | "), TextStyle::meta()));
    }

    flow.push(Flowable::Spacer(6.0));
    flow.push(Flowable::Rule);
    flow
}

fn score_table(eval: &Evaluation) -> Flowable {
    let s = &eval.scores;
    let row = |label: &str, value: String| vec![label.to_string(), value];
    Flowable::Table {
        rows: vec![
            row("Creativity", format!("{}/10", s.creativity)),
            row("Feasibility", format!("{}/10", s.feasibility)),
            row("Uniqueness", format!("{}/10", s.uniqueness)),
            row("Impact", format!("{}/10", s.impact)),
            row("Overall", format!("{:.1}/10", eval.overall_score)),
        ],
        col_widths: vec![140.0, 80.0],
        style: TextStyle::body(),
    }
}

fn category_block(category: &Category) -> Vec<Flowable> {
    let mut flow = vec![text_block(&category.name, TextStyle::subheading())];
    if !category.description.trim().is_empty() {
        flow.push(text_block(&category.description, TextStyle::body()));
    }
    if !category.idea_ids.is_empty() {
        let ids = category
            .idea_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        flow.push(text_block(&format!("Ideas: {}", ids), TextStyle::meta()));
    }
    if !category.key_characteristics.trim().is_empty() {
        flow.push(text_block(
            &format!("Key characteristics: {}", category.key_characteristics),
            TextStyle::body(),
        ));
    }
    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scores;

    fn idea(id: u32, title: &str) -> Idea {
        let mut idea = Idea::new(id, title, format!("{title} pitch"));
        idea.description = format!("{title} description");
        idea
    }

    fn eval(id: u32, c: u8, f: u8, u: u8, i: u8) -> Evaluation {
        Evaluation::new(id, Scores::new(c, f, u, i).unwrap(), "")
    }

    #[test]
    fn test_sorted_by_descending_overall() {
        let mut report = IdeasReport::new(vec![idea(1, "Low"), idea(2, "High"), idea(3, "None")]);
        report.evaluations = vec![eval(1, 3, 3, 3, 3), eval(2, 9, 9, 9, 9)];
        let titles: Vec<_> = report.ranked().iter().map(|(i, _)| i.title.as_str()).collect();
        assert_eq!(titles, ["High", "Low", "None"]);
    }

    #[test]
    fn test_unscored_keeps_input_order() {
        let report = IdeasReport::new(vec![idea(2, "B"), idea(1, "A")]);
        let model = ideas_layout(&report);
        assert!(model.contains("2. B"));
        assert!(model.page_of("2. B") <= model.page_of("1. A"));
        assert!(!model.contains("/10"));
    }

    #[test]
    fn test_top_n_divider_and_truncation() {
        let mut report = IdeasReport::new(vec![idea(1, "A"), idea(2, "B"), idea(3, "C")])
            .with_top(Some(2));
        report.evaluations = vec![eval(1, 5, 5, 5, 5), eval(2, 6, 6, 6, 6), eval(3, 7, 7, 7, 7)];
        let model = ideas_layout(&report);
        assert!(model.contains("Top 2 Ideas"));
        assert!(model.contains("2 Creative AI Experiment Ideas"));
        assert!(model.contains("#1: C"));
        assert!(model.contains("#2: B"));
        assert!(!model.contains("A pitch"));
    }

    #[test]
    fn test_metadata_line_and_categories() {
        let mut first = idea(1, "Dream Radio");
        first.domain = ["Art".to_string(), "Sleep".to_string()].into();
        first.ai_technologies = ["Diffusion".to_string()].into();
        let mut report = IdeasReport::new(vec![first]);
        report.categories = vec![Category {
            name: "Nocturnal".into(),
            description: "Night things".into(),
            idea_ids: [1].into(),
            key_characteristics: "dark".into(),
        }];
        let model = ideas_layout(&report);
        assert!(model.contains("Domains: Art, Sleep | Technologies: Diffusion"));
        assert!(model.contains("Nocturnal"));
        assert!(model.contains("Ideas: 1"));
    }
}
