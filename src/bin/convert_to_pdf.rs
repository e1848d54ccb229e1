use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use weird_ideator::ingest::IdeaExtractor;
use weird_ideator::models::IdeationSession;
use weird_ideator::render::{IdeasReport, render_ideas_pdf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert ideation reports (markdown or JSON) to PDF", long_about = None)]
struct Args {
    /// Report file, or a directory with --batch
    input: PathBuf,

    /// Output PDF path (single file) or directory (batch)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Convert every .md file in the input directory
    #[arg(long)]
    batch: bool,

    /// Only include the N highest-scoring ideas
    #[arg(long)]
    top: Option<usize>,
}

fn main() -> ExitCode {
    weird_ideator::init_tracing();
    let args = Args::parse();

    let outcome = if args.batch {
        convert_batch(&args)
    } else {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("pdf"));
        convert_file(&args.input, &output, args.top).map(|_| ())
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Convert one report. JSON input is read as a structured session,
/// anything else goes through the markdown extractor.
fn convert_file(input: &Path, output: &Path, top: Option<usize>) -> Result<usize> {
    if !input.is_file() {
        bail!("input file not found: {}", input.display());
    }
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let report = if is_json {
        IdeationSession::from_json(&text)
            .map(IdeasReport::from_session)
            .with_context(|| format!("parsing session {}", input.display()))?
    } else {
        IdeasReport::from_extraction(IdeaExtractor::default().extract_with_evaluations(&text))
    };
    let report = report.with_top(top);

    let count = report.ranked().len();
    info!(input = %input.display(), ideas = count, "Extracted ideas");

    let bytes = render_ideas_pdf(&report)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;

    println!("{} -> {} ({} ideas)", input.display(), output.display(), count);
    Ok(count)
}

fn convert_batch(args: &Args) -> Result<()> {
    if !args.input.is_dir() {
        bail!("{} is not a directory", args.input.display());
    }

    let mut inputs: Vec<PathBuf> = fs::read_dir(&args.input)
        .with_context(|| format!("listing {}", args.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        bail!("no markdown files found in {}", args.input.display());
    }

    let out_dir = args.output.clone().unwrap_or_else(|| args.input.clone());
    let mut converted = 0usize;
    for input in &inputs {
        let Some(stem) = input.file_stem() else {
            continue;
        };
        let output = out_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        match convert_file(input, &output, args.top) {
            Ok(_) => converted += 1,
            Err(e) => {
                warn!(input = %input.display(), "Conversion failed: {:#}", e);
                eprintln!("Skipping {}: {:#}", input.display(), e);
            }
        }
    }

    println!("Converted {}/{} files", converted, inputs.len());
    Ok(())
}
