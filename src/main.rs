use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use weird_ideator::config::{API_KEY_VAR, Config, PLACEHOLDER_API_KEY};
use weird_ideator::error::IdeatorError;
use weird_ideator::output::ArtifactWriter;
use weird_ideator::prompts::PromptRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate, amplify, judge and report weird AI experiment ideas", long_about = None)]
struct Args {
    /// Validate configuration and print the stage plan without calling any model
    #[arg(long)]
    check: bool,

    /// TOML config file (defaults to IDEATOR_CONFIG, then ./ideator.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    weird_ideator::init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            if e
                .downcast_ref::<IdeatorError>()
                .is_some_and(IdeatorError::is_fatal_for_run)
            {
                eprintln!("Run aborted; no reports were written.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;

    if config.api_key.is_none() {
        eprintln!("Error: {} not found in environment variables", API_KEY_VAR);
        eprintln!("Set it in your shell or in a .env file, then run again.");
        return Ok(ExitCode::from(1));
    }

    if args.check {
        return check(&config);
    }

    let pipeline = weird_ideator::openrouter_pipeline(&config)?;
    info!(
        model = %config.model,
        num_ideas = config.num_ideas,
        "Pipeline: {}",
        pipeline.graph().describe()
    );

    let result = pipeline.run().await.context("ideation run failed")?;

    let writer = ArtifactWriter::new(&config.output_dir);
    let artifacts = writer.write_run(&result).context("writing reports")?;

    println!("Markdown report: {}", artifacts.markdown.display());
    println!("JSON report:     {}", artifacts.json.display());
    println!("PDF report:      {}", artifacts.pdf.display());
    Ok(ExitCode::SUCCESS)
}

/// `--check`: configuration sanity without any external call
fn check(config: &Config) -> Result<ExitCode> {
    if config.api_key.as_deref() == Some(PLACEHOLDER_API_KEY) {
        eprintln!(
            "Error: {} is still the placeholder value; set a real key",
            API_KEY_VAR
        );
        return Ok(ExitCode::from(1));
    }

    let graph = config.stage_graph()?;
    println!("Configuration OK");
    println!("Output directory: {}", config.output_dir.display());
    println!("Ideas per run:    {}", config.num_ideas);
    println!("Pipeline:         {}", graph.describe());
    for stage in graph.stages() {
        let context = if stage.context.is_empty() {
            "-".to_string()
        } else {
            stage.context.join(", ")
        };
        println!(
            "  {:<16} {:<16} model={} temperature={:.2} sees=[{}]",
            stage.name,
            stage.kind.as_str(),
            stage.model,
            stage.temperature,
            context
        );
    }
    println!("Prompts:");
    for prompt in PromptRegistry::new().list() {
        println!(
            "  {:<16} {} v{} sha1={}",
            prompt.kind.as_str(),
            prompt.id,
            prompt.version,
            &prompt.lineage.checksum[..12]
        );
    }
    Ok(ExitCode::SUCCESS)
}
