//! Structured records for extracted ideas, their evaluations and categories

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{IdeatorError, Result};

/// Maximum length of an elevator pitch, in characters
pub const MAX_PITCH_CHARS: usize = 200;

/// One proposed experiment, as extracted from generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: u32,
    pub title: String,
    pub elevator_pitch: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub feasibility: String,
    #[serde(default)]
    pub potential_impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_viability: Option<String>,
    #[serde(default)]
    pub domain: BTreeSet<String>,
    #[serde(default)]
    pub ai_technologies: BTreeSet<String>,
}

impl Idea {
    /// Build an idea with only the identifying fields set
    pub fn new(id: u32, title: impl Into<String>, elevator_pitch: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            elevator_pitch: truncate_chars(&elevator_pitch.into(), MAX_PITCH_CHARS),
            description: String::new(),
            implementation: String::new(),
            feasibility: String::new(),
            potential_impact: String::new(),
            commercial_viability: None,
            domain: BTreeSet::new(),
            ai_technologies: BTreeSet::new(),
        }
    }
}

/// The four 1-10 criteria an evaluator scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(rename = "creativity_score")]
    pub creativity: u8,
    #[serde(rename = "feasibility_score")]
    pub feasibility: u8,
    #[serde(rename = "uniqueness_score")]
    pub uniqueness: u8,
    #[serde(rename = "impact_score")]
    pub impact: u8,
}

impl Scores {
    pub fn new(creativity: u8, feasibility: u8, uniqueness: u8, impact: u8) -> Result<Self> {
        let scores = Self {
            creativity,
            feasibility,
            uniqueness,
            impact,
        };
        scores.validate()?;
        Ok(scores)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("creativity", self.creativity),
            ("feasibility", self.feasibility),
            ("uniqueness", self.uniqueness),
            ("impact", self.impact),
        ] {
            if !(1..=10).contains(&value) {
                return Err(IdeatorError::Validation {
                    message: format!("{name} score must be between 1 and 10, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Arithmetic mean of the four scores
    pub fn mean(&self) -> f64 {
        let total = u32::from(self.creativity)
            + u32::from(self.feasibility)
            + u32::from(self.uniqueness)
            + u32::from(self.impact);
        f64::from(total) / 4.0
    }
}

/// Evaluation of a single idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub idea_id: u32,
    #[serde(flatten)]
    pub scores: Scores,
    pub overall_score: f64,
    #[serde(default)]
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_to: Option<BTreeSet<u32>>,
}

impl Evaluation {
    pub fn new(idea_id: u32, scores: Scores, justification: impl Into<String>) -> Self {
        Self {
            idea_id,
            scores,
            overall_score: scores.mean(),
            justification: justification.into(),
            similar_to: None,
        }
    }

    /// Validate score ranges and recompute the overall score from them
    pub fn normalized(mut self) -> Result<Self> {
        self.scores.validate()?;
        self.overall_score = self.scores.mean();
        Ok(self)
    }
}

/// A thematic grouping of ideas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub idea_ids: BTreeSet<u32>,
    #[serde(default)]
    pub key_characteristics: String,
}

/// Complete structured session, as accepted by the PDF converter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeationSession {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub num_ideas: usize,
    pub ideas: Vec<Idea>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub top_ideas: Vec<u32>,
    #[serde(default)]
    pub summary: String,
}

impl IdeationSession {
    /// Parse a session document, validating every evaluation
    pub fn from_json(text: &str) -> Result<Self> {
        let mut session: IdeationSession = serde_json::from_str(text)?;
        session.evaluations = session
            .evaluations
            .into_iter()
            .map(Evaluation::normalized)
            .collect::<Result<Vec<_>>>()?;
        if session.num_ideas == 0 {
            session.num_ideas = session.ideas.len();
        }
        Ok(session)
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
