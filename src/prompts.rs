//! Versioned prompt registry for the ideation stages
//!
//! Every stage kind owns exactly one prompt: a persona used as the system
//! message, a task template rendered with `{{placeholder}}` inputs, and the
//! expected-output line appended to the task. Each prompt carries a lineage
//! record with a SHA-1 checksum of its template so a run can state exactly
//! which prompt text produced it.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IdeatorError, Result};
use crate::pipeline::StageKind;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("placeholder regex"));

/// System-message persona for a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Persona {
    /// Render as a system message
    pub fn system_message(&self) -> String {
        format!(
            "You are {}.\nYour goal: {}\n\n{}",
            self.role, self.goal, self.backstory
        )
    }
}

/// Represents a prompt's evolution history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptLineage {
    /// Parent prompt ID if this is a refinement
    pub parent_id: Option<String>,
    /// Git-style SHA1 checksum of the template
    pub checksum: String,
    pub change_rationale: Option<String>,
}

/// Core prompt definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Stable identifier (format: stage-name-vN)
    pub id: String,
    pub kind: StageKind,
    pub one_liner: String,
    pub persona: Persona,
    /// Input placeholders with descriptions
    pub inputs: HashMap<String, String>,
    pub version: String,
    pub lineage: PromptLineage,
    pub template: String,
    pub expected_output: String,
}

impl Prompt {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        kind: StageKind,
        one_liner: impl Into<String>,
        persona: Persona,
        template: impl Into<String>,
        expected_output: impl Into<String>,
        inputs: HashMap<String, String>,
        parent_id: Option<String>,
        change_rationale: Option<String>,
    ) -> Self {
        let template = template.into();
        let checksum = sha1_checksum(&template);

        Self {
            id: id.into(),
            kind,
            one_liner: one_liner.into(),
            persona,
            inputs,
            version: "1.0.0".to_string(),
            lineage: PromptLineage {
                parent_id,
                checksum,
                change_rationale,
            },
            template,
            expected_output: expected_output.into(),
        }
    }

    /// Substitute every `{{name}}` placeholder. A placeholder with no value is a
    /// configuration error, since the stage would otherwise send a literal brace pair.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String> {
        let full = format!(
            "{}\n\nExpected output: {}",
            self.template.trim_end(),
            self.expected_output
        );
        let mut missing = None;
        let body = PLACEHOLDER_RE.replace_all(&full, |caps: &regex::Captures| {
            let key = &caps[1];
            match vars.get(key) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| key.to_string());
                    String::new()
                }
            }
        });
        if let Some(key) = missing {
            return Err(IdeatorError::config(format!(
                "prompt '{}' needs a value for '{{{{{}}}}}'",
                self.id, key
            )));
        }
        Ok(body.into_owned())
    }
}

/// Generate a SHA1 checksum of prompt content
fn sha1_checksum(content: &str) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Registry of the stage prompts
#[derive(Debug, Default)]
pub struct PromptRegistry {
    prompts: HashMap<StageKind, Arc<Prompt>>,
}

impl PromptRegistry {
    /// Create a registry holding the built-in stage prompts
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_core_prompts();
        registry
    }

    /// Add or replace the prompt for its stage kind
    pub fn register(&mut self, prompt: Prompt) {
        self.prompts.insert(prompt.kind, Arc::new(prompt));
    }

    pub fn get(&self, kind: StageKind) -> Option<Arc<Prompt>> {
        self.prompts.get(&kind).cloned()
    }

    pub fn require(&self, kind: StageKind) -> Result<Arc<Prompt>> {
        self.get(kind).ok_or_else(|| {
            IdeatorError::config(format!("no prompt registered for stage kind '{}'", kind))
        })
    }

    pub fn list(&self) -> Vec<Arc<Prompt>> {
        let mut prompts: Vec<_> = self.prompts.values().cloned().collect();
        prompts.sort_by_key(|p| p.kind);
        prompts
    }

    fn register_core_prompts(&mut self) {
        let count_input: HashMap<String, String> = [(
            "num_ideas".to_string(),
            "How many ideas to generate".to_string(),
        )]
        .into();

        self.register(Prompt::new(
            "generation-weird-v1",
            StageKind::Generation,
            "Generate the initial batch of weird experiment ideas",
            Persona {
                role: "Curious Experiment Designer".into(),
                goal: "Generate genuinely interesting, surprising AI experiment ideas that make people think".into(),
                backstory: GENERATOR_BACKSTORY.into(),
            },
            GENERATION_TEMPLATE,
            "A list of {{num_ideas}} genuinely weird and unconventional AI experiment ideas that push creative boundaries.",
            count_input,
            None,
            None,
        ));

        self.register(Prompt::new(
            "amplify-sketch-v1",
            StageKind::Amplification1,
            "Blind enhancement pass over concept sketches",
            Persona {
                role: "Independent Idea Reviewer".into(),
                goal: "Review these AI experiment ideas and make them more interesting and surprising".into(),
                backstory: REVIEWER_1_BACKSTORY.into(),
            },
            AMPLIFY_1_TEMPLATE,
            "A complete list of enhanced concepts, each with the initial sketch, your enhanced version, and notes on the transformation.",
            HashMap::new(),
            None,
            None,
        ));

        self.register(Prompt::new(
            "amplify-chaos-v2",
            StageKind::Amplification2,
            "Second blind pass pushing each idea to its boldest version",
            Persona {
                role: "Independent Concept Evaluator".into(),
                goal: "Review these AI experiment ideas and find the versions that people would actually build and share".into(),
                backstory: REVIEWER_2_BACKSTORY.into(),
            },
            AMPLIFY_2_TEMPLATE,
            "A complete list showing preliminary ideas transformed into their most experimental, memorable, unhinged versions.",
            HashMap::new(),
            Some("amplify-chaos-v1".into()),
            Some("Framed as a blind review so it never anchors on the first amplifier".into()),
        ));

        self.register(Prompt::new(
            "evaluate-scores-v1",
            StageKind::Evaluation,
            "Score every idea on four criteria",
            Persona {
                role: "Rigorous Experiment Evaluator".into(),
                goal: "Score each idea fairly and point out which ones deserve to be built first".into(),
                backstory: EVALUATOR_BACKSTORY.into(),
            },
            EVALUATION_TEMPLATE,
            "A comprehensive evaluation of all ideas with scores, justifications, similarity analysis, top 10 highlights, and strategic recommendations.",
            HashMap::new(),
            None,
            None,
        ));

        self.register(Prompt::new(
            "categorize-themes-v1",
            StageKind::Categorization,
            "Organize ideas into thematic categories",
            Persona {
                role: "Idea Cartographer".into(),
                goal: "Map the idea landscape into clear, useful themes".into(),
                backstory: CATEGORIZER_BACKSTORY.into(),
            },
            CATEGORIZATION_TEMPLATE,
            "A well-organized taxonomy of all ideas with clear categories, subcategories, cross-cutting themes, and strategic insights about the idea landscape.",
            HashMap::new(),
            None,
            None,
        ));

        self.register(Prompt::new(
            "synthesize-report-v1",
            StageKind::Synthesis,
            "Final report with build plans for the best ideas",
            Persona {
                role: "The Builder".into(),
                goal: "Select the best ideas and create actionable plans to actually build them".into(),
                backstory: SYNTHESIZER_BACKSTORY.into(),
            },
            SYNTHESIS_TEMPLATE,
            "A comprehensive, well-formatted markdown report synthesizing all findings with executive summary, top ideas, thematic analysis, feasibility assessment, commercial opportunities, and actionable recommendations.",
            HashMap::new(),
            None,
            None,
        ));
    }
}

const GENERATOR_BACKSTORY: &str = r#"You design experiments that make people say "huh, I never thought of that!"

You love ideas that are:
- Surprising but make sense once you hear them
- Playful, curious, whimsical
- Asking interesting questions about AI, humans, or both
- Actually doable with current or near-future tech

You AVOID:
- Dark, dystopian, horror vibes
- Generic "AI for X" applications
- Overly abstract conceptual art

Think more "delightful and thought-provoking" than "unsettling"."#;

const REVIEWER_1_BACKSTORY: &str = r#"You've been asked to do a BLIND REVIEW of some AI experiment ideas.
You don't know who created them or if anyone else has reviewed them.

Your job is simple: take each idea and find the MORE INTERESTING version hiding inside.

When you see a concept, you ask:
- "What if we pushed this further?"
- "What unexpected twist would make this more memorable?"
- "What connection to another domain would create surprise?"
- "What would make someone actually want to try this?"

You ADD depth and interest while keeping things GROUNDED - weird but achievable,
surprising but coherent."#;

const REVIEWER_2_BACKSTORY: &str = r#"You've been asked to do a BLIND REVIEW of some AI experiment ideas.
You don't know who created them or what feedback (if any) they've received before.

Your unique talent is finding the "viral kernel" in ideas - the version that makes
people immediately want to share it or try it themselves.

For each idea, you ask yourself:
- What's the Kickstarter pitch that would get funded?
- What's the tweet that makes people click?
- What's the hook that makes this unforgettable?"#;

const EVALUATOR_BACKSTORY: &str = r#"You have reviewed hundreds of experimental projects for grants and festivals.
You score honestly, you notice when two ideas are secretly the same idea, and you
always explain a score in one or two sentences."#;

const CATEGORIZER_BACKSTORY: &str = r#"You love taxonomies that reveal something. You group ideas by what they
are really about, not by surface keywords, and you point out where the map is empty."#;

const SYNTHESIZER_BACKSTORY: &str = r#"You've shipped weird projects before. Art installations, strange apps,
experimental experiences. You know what it takes to go from "cool idea" to "real thing."

For each idea you select, you provide:
- A clear vision anyone could understand
- Specific tech/tools needed
- A realistic MVP approach
- Where this would live (app, installation, event, etc.)

You keep the magic while making things REAL."#;

const GENERATION_TEMPLATE: &str = r#"Generate {{num_ideas}} WEIRD, UNCONVENTIONAL AI experiment ideas.

IMPORTANT: DO NOT generate boring, predictable ideas like:
- Chatbots for customer service
- AI for productivity/scheduling
- Personalized recommendations
- Healthcare diagnostics
- Educational tutors
These are BANNED. If you catch yourself writing something like this, DELETE IT.

Each idea MUST be:
- WEIRD - something that makes people do a double-take
- UNEXPECTED - not the obvious application of AI
- MEMORABLE - something people would share and talk about
- EXPERIMENTAL - pushing boundaries of what's "normal"

Draw from domains like:
- Absurdist art installations
- Social experiments that reveal human nature
- AI that intentionally fails in interesting ways
- Glitch aesthetics and embracing errors
- AI as performance art or ritual
- Systems that are deliberately inefficient but beautiful
- AI that explores liminal spaces, dreams, boredom

For each idea, provide:
- **Title**: A memorable, evocative name (not corporate-speak!)
- **Elevator Pitch**: One sentence hook
- **Description**: What makes this strange and compelling
- **Implementation**: Technical approach (grounded enough to actually do)
- **Potential Impact**: The deeper insight or question this explores
- **Domains** and **AI Technologies**: comma-separated lists

Number each idea clearly (1-{{num_ideas}}) using the form "N. Title" and make them DISTINCT."#;

const AMPLIFY_1_TEMPLATE: &str = r#"You've been given a collection of INITIAL CONCEPT SKETCHES.
These are rough, first-draft ideas that have potential but need your creative vision.

For EACH concept sketch, create an ENHANCED VERSION that:
- Removes the boring, predictable parts
- Amplifies what makes it interesting
- Adds unexpected elements from other domains
- Makes it something people will actually remember

Structure your output as:

---
## Concept N: [Your New Title]

### Initial Sketch
[Summarize the concept you received]

### Enhanced Version
[Your transformed, amplified take - make it 10x more interesting]

### What Changed
[Brief note on what you added/removed to make it better]

---

Transform ALL concepts. Each one has hidden potential - find it."#;

const AMPLIFY_2_TEMPLATE: &str = r#"You've received a batch of PRELIMINARY IDEAS from the ideation team.
They're okay starting points, but they're playing it way too safe.

Your mission: Take each preliminary idea and CREATE THE UNHINGED VERSION.

For each idea, ask yourself:
- What if we went 10x further?
- What would the fever dream version look like?
- What if we combined this with something completely incompatible?
- What version would people still talk about in 20 years?

Structure your output as:

---
## Idea N: [Your Bold New Title]

### Preliminary Version
[The idea as you received it]

### MAXIMUM CHAOS VERSION
[Your wildest interpretation]

### The Transformation
[What pushed this from "interesting" to "unforgettable"?]

---

Do this for EVERY SINGLE IDEA. No exceptions."#;

const EVALUATION_TEMPLATE: &str = r#"Evaluate each AI experiment idea on the following criteria:

1. **Creativity Score (1-10)**: How original and innovative is this idea?
2. **Feasibility Score (1-10)**: How realistic is it to implement with current technology?
3. **Uniqueness Score (1-10)**: How different is this from other ideas in the list?
4. **Impact Score (1-10)**: What potential value or insights could this provide?
5. **Overall Score**: Average of the above scores

For each idea, provide:
- Scores for each criterion, one per line as "Creativity: N/10"
- Brief justification for scores
- Identification of any ideas that are too similar to each other
- Highlight of the top 10 most promising ideas

Create a summary analysis identifying:
- Patterns in the idea generation
- Diversity assessment of the entire set
- Any gaps or underexplored areas
- Recommendations for which ideas to prioritize"#;

const CATEGORIZATION_TEMPLATE: &str = r#"Organize all AI experiment ideas into meaningful thematic categories.

Your categorization should:
1. Create 5-10 high-level categories that capture the main themes
2. Assign each idea to one or more categories (ideas can belong to multiple categories)
3. Identify subcategories where appropriate
4. Look for cross-cutting themes (e.g., "uses multi-agent systems", "involves physical world", "artistic focus")

For each category, provide:
- Category name and description
- List of ideas that belong to it
- Key characteristics of ideas in this category
- Potential synergies between ideas in the category

Also provide:
- A visual-friendly category tree structure
- Identification of the most and least populated categories
- Suggestions for categories that could be expanded in future ideation sessions"#;

const SYNTHESIS_TEMPLATE: &str = r#"Create a comprehensive final report that synthesizes all the work:

1. **Executive Summary**: overview of the process, key statistics, most notable ideas
2. **Top Ideas Showcase**: the top 10-15 ideas, why they stand out, an implementation roadmap
3. **Thematic Analysis**: categories, trends, connections between seemingly different ideas
4. **Diversity Assessment**: repetition, well-covered vs. underexplored domains
5. **Feasibility Tiers**: quick wins, medium-term projects, long-term visions
6. **Commercial Opportunities**: market potential, business models, niches
7. **Recommendations**: what to prioritize, resource allocation, next steps

Make the report engaging, well-structured, and actionable. Use markdown formatting for clarity."#;
