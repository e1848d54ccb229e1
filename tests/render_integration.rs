use chrono::{TimeZone, Utc};
use weird_ideator::ingest::IdeaExtractor;
use weird_ideator::models::{Evaluation, Idea, IdeationSession, Scores};
use weird_ideator::pipeline::{IdeationResult, StageKind, StageOutput};
use weird_ideator::render::pdf::{ideas_layout, run_layout};
use weird_ideator::render::{
    IdeasReport, parse_json, render_ideas_pdf, render_json, render_markdown, render_run_pdf,
};

fn blinded_run() -> IdeationResult {
    let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    let mut result = IdeationResult::new(ts, "google/gemini-2.5-flash-lite");
    let stages = [
        ("generation", StageKind::Generation, vec![]),
        ("amplified_1", StageKind::Amplification1, vec!["generation"]),
        ("amplified_2", StageKind::Amplification2, vec!["generation"]),
        (
            "evaluation",
            StageKind::Evaluation,
            vec!["generation", "amplified_1", "amplified_2"],
        ),
        (
            "categorization",
            StageKind::Categorization,
            vec!["generation", "amplified_1", "amplified_2"],
        ),
        (
            "final",
            StageKind::Synthesis,
            vec![
                "generation",
                "amplified_1",
                "amplified_2",
                "evaluation",
                "categorization",
            ],
        ),
    ];
    for (name, kind, context) in stages {
        result
            .record(StageOutput {
                stage_name: name.to_string(),
                kind,
                raw_text: format!("# {name}\n\n1. Idea from {name}\nDescription: \u{201C}quoted\u{201D} text."),
                context_stage_names: context.into_iter().map(String::from).collect(),
            })
            .unwrap();
    }
    result
}

#[test]
fn json_round_trip_preserves_every_stage() {
    let run = blinded_run();
    let text = serde_json::to_string(&render_json(&run).unwrap()).unwrap();
    let parsed = parse_json(&text).unwrap();
    assert_eq!(parsed, run);
    assert_eq!(
        parsed.get("amplified_2").unwrap().context_stage_names,
        ["generation"]
    );
}

#[test]
fn markdown_report_covers_all_parts() {
    let md = render_markdown(&blinded_run());
    for (n, title) in [
        (1, "Initial Weird Ideas Generation"),
        (2, "First Weirdness Amplification (Blinded)"),
        (3, "Second Amplification - MAXIMUM CHAOS"),
        (4, "Evaluation"),
        (5, "Categorization"),
        (6, "Final Synthesis"),
    ] {
        assert!(md.contains(&format!("## Part {n}: {title}")), "missing part {n}");
    }
    assert!(md.contains(
        "**Pipeline:** Generator -> Amplifier #1 -> Amplifier #2 (blinded) -> Evaluator -> Categorizer (blinded) -> Synthesizer"
    ));
}

#[test]
fn run_pdf_is_a_pdf() {
    let bytes = render_run_pdf(&blinded_run()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn run_layout_transliterates_quotes() {
    let model = run_layout(&blinded_run());
    assert!(model.contains("\"quoted\" text."));
    assert_eq!(model.failed_blocks, 0);
}

fn scored_idea(id: u32, title: &str, scores: (u8, u8, u8, u8)) -> (Idea, Evaluation) {
    let idea = Idea::new(id, title, format!("{title} in one line"));
    let (c, f, u, i) = scores;
    let eval = Evaluation::new(id, Scores::new(c, f, u, i).unwrap(), "ok");
    (idea, eval)
}

#[test]
fn ideas_pdf_ranks_by_overall_score() {
    let (a, ea) = scored_idea(1, "Middling", (5, 5, 5, 5));
    let (b, eb) = scored_idea(2, "Dream Radio", (8, 6, 9, 7));
    let (c, ec) = scored_idea(3, "Dud", (2, 2, 2, 2));
    let mut report = IdeasReport::new(vec![a, b, c]);
    report.evaluations = vec![ea, eb, ec];

    let model = ideas_layout(&report);
    assert!(model.contains("#1: Dream Radio"));
    assert!(model.contains("#2: Middling"));
    assert!(model.contains("#3: Dud"));
    assert!(model.contains("7.5/10"));
    assert!(model.contains("8/10"));

    let text = model.text();
    let first = text.find("Dream Radio").unwrap();
    let second = text.find("Middling").unwrap();
    assert!(first < second);

    let bytes = render_ideas_pdf(&report).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn control_characters_do_not_abort_ideas_pdf() {
    let mut idea = Idea::new(1, "Glitch", "Breaks things");
    idea.description = "before \u{0} after".into();
    idea.implementation = "still rendered".into();
    let report = IdeasReport::new(vec![idea]);

    let model = ideas_layout(&report);
    assert_eq!(model.failed_blocks, 1);
    assert!(model.contains("still rendered"));
    assert!(render_ideas_pdf(&report).unwrap().starts_with(b"%PDF"));
}

#[test]
fn markdown_to_pdf_pipeline() {
    let text = "1. Foo\nDescription: bar baz\n2. Quux\nDescription: zap";
    let report = IdeasReport::from_extraction(IdeaExtractor::default().extract_with_evaluations(text));
    let model = ideas_layout(&report);
    assert!(model.contains("2 Creative AI Experiment Ideas"));
    assert!(model.contains("1. Foo"));
    assert!(model.contains("\"bar baz\""));
}

#[test]
fn session_json_feeds_ideas_pdf() {
    let json = r#"{
        "timestamp": "2025-03-14T09:26:53",
        "ideas": [
            {"id": 1, "title": "Dream Radio", "elevator_pitch": "Radio for dreams",
             "domain": ["Art"], "ai_technologies": ["Diffusion"]},
            {"id": 2, "title": "Sad Toasters", "elevator_pitch": "Sulking appliances"}
        ],
        "evaluations": [
            {"idea_id": 1, "creativity_score": 8, "feasibility_score": 6,
             "uniqueness_score": 9, "impact_score": 7, "overall_score": 0},
            {"idea_id": 2, "creativity_score": 9, "feasibility_score": 9,
             "uniqueness_score": 9, "impact_score": 9, "overall_score": 0}
        ],
        "categories": [
            {"name": "Domestic Absurdity", "description": "Home things", "idea_ids": [2]}
        ]
    }"#;
    let session = IdeationSession::from_json(json).unwrap();
    let report = IdeasReport::from_session(session).with_top(Some(1));
    let model = ideas_layout(&report);
    assert!(model.contains("Top 1 Ideas"));
    assert!(model.contains("#1: Sad Toasters"));
    assert!(!model.contains("Dream Radio"));
    assert!(model.contains("Domestic Absurdity"));
}
