//! Command-line interface for postgen.
//!
//! `generate` runs one or more generation requests, optionally edits the
//! resulting drafts and writes the requested exports. `check` probes the image
//! model with the configured credential.
//!
//! All generation, editing and export logic lives in `postgen-core`; this
//! module only maps arguments onto it and prints results.
use crate::load_config::{load_or_default, CliConfig, API_KEY_ENV};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use postgen_core::contract::{GenerationOutcome, GenerationRequest, ImageError};
use postgen_core::draft::PostDraft;
use postgen_core::export::{export_posts, ExportKind};
use postgen_core::image_gen::ImageGenerationAdapter;
use postgen_core::orchestrator::GenerationOrchestrator;
use postgen_core::platform::Platform;
use postgen_core::transport::HttpTransport;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Generate social media posts (image, caption and hashtags) from a topic.
#[derive(Parser)]
#[clap(
    name = "postgen",
    version,
    about = "Generate an image, caption and hashtags for a social media post"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate posts for one or more topics
    Generate(GenerateArgs),
    /// Check whether the image model accepts requests with the configured key
    Check,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Topic to write about; repeat for a batch
    #[clap(long = "topic", required = true)]
    pub topics: Vec<String>,

    /// Target platform: instagram, twitter or linkedin
    #[clap(long, default_value = "instagram")]
    pub platform: Platform,

    /// Image style, e.g. professional, casual, artistic, minimalist, vibrant
    #[clap(long, default_value = "professional")]
    pub style: String,

    /// Replace the generated caption
    #[clap(long)]
    pub caption: Option<String>,

    /// Remove the hashtag at this zero-based position; repeatable
    #[clap(long = "drop-hashtag")]
    pub drop_hashtags: Vec<usize>,

    /// Re-run requests whose image failed, using the configured retry style
    #[clap(long)]
    pub retry: bool,

    /// Comma-separated exports: image, text, composite, csv
    #[clap(long, value_delimiter = ',')]
    pub export: Vec<ExportKind>,

    /// Directory for exports; overrides the config file
    #[clap(long)]
    pub out_dir: Option<PathBuf>,

    /// Print posts as JSON
    #[clap(long)]
    pub json: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_or_default(cli.config.as_deref())?;
    config.inference.trace_loaded();
    config.generation.trace_loaded();

    match cli.command {
        Commands::Generate(args) => generate(&config, args).await,
        Commands::Check => check(&config).await,
    }
}

async fn check(config: &CliConfig) -> Result<()> {
    tracing::info!(command = "check", "Checking image model availability");
    let transport = HttpTransport::new(&config.inference).context("Failed to build HTTP client")?;
    let adapter = ImageGenerationAdapter::new(config.inference.clone(), Arc::new(transport));

    if adapter.check_availability().await {
        println!("Image model available: {}", config.inference.image_model_url);
    } else {
        println!("Image model unavailable: {}", config.inference.image_model_url);
        if !config.inference.is_configured() {
            println!("Set {API_KEY_ENV} in the environment or a .env file.");
        }
    }
    Ok(())
}

async fn generate(config: &CliConfig, args: GenerateArgs) -> Result<()> {
    let requests = args
        .topics
        .iter()
        .map(|topic| GenerationRequest::new(topic, args.platform, &args.style))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid generation request")?;

    let orchestrator = GenerationOrchestrator::from_config(&config.inference, config.generation.clone())
        .context("Failed to set up generation")?;
    tracing::info!(command = "generate", requests = requests.len(), "Starting generation");

    let mut outcomes = Vec::with_capacity(requests.len());
    if requests.len() == 1 {
        outcomes.push(orchestrator.generate(&requests[0]).await);
    } else {
        for settled in orchestrator.generate_batch(requests).await {
            match settled {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Generation run terminated unexpectedly");
                    eprintln!("A generation run failed: {e}");
                }
            }
        }
    }

    if args.retry {
        for outcome in outcomes.iter_mut() {
            if outcome.image_failed() {
                *outcome = orchestrator.retry(&outcome.request).await;
            }
        }
    }

    let mut drafts = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        drafts.push(edit_draft(outcome, &args)?);
    }

    if args.json {
        let summaries: Vec<PostSummary> = outcomes
            .iter()
            .zip(&drafts)
            .map(|(outcome, draft)| PostSummary::new(outcome, draft))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for (outcome, draft) in outcomes.iter().zip(&drafts) {
            print_post(outcome, draft);
        }
    }

    let notice = orchestrator.subscribe_notices().borrow().clone();
    if let (Some(notice), false) = (notice, args.json) {
        println!("{}", notice.message);
    }

    if !args.export.is_empty() {
        let dir = args
            .out_dir
            .clone()
            .unwrap_or_else(|| config.export.output_dir.clone());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
        for report in export_posts(&dir, &drafts, &args.export, Utc::now()) {
            match report.result {
                Ok(path) => println!("Exported {} to {}", report.kind, path.display()),
                Err(e) => eprintln!("Export {} failed: {e}", report.kind),
            }
        }
    }

    Ok(())
}

/// Applies the caption override and hashtag removals to a fresh draft.
fn edit_draft(outcome: &GenerationOutcome, args: &GenerateArgs) -> Result<PostDraft> {
    let mut draft = PostDraft::from_outcome(outcome);
    if let Some(caption) = &args.caption {
        draft.edit_caption(caption.clone())?;
    }

    // Positions refer to the generated list, so remove from the back.
    let mut positions = args.drop_hashtags.clone();
    positions.sort_unstable_by(|a, b| b.cmp(a));
    positions.dedup();
    for index in positions {
        let removed = draft.remove_hashtag(index)?;
        tracing::debug!(%removed, index, "Removed hashtag");
    }
    Ok(draft)
}

fn print_post(outcome: &GenerationOutcome, draft: &PostDraft) {
    let usage = draft.caption_usage();
    println!("Topic: {} ({})", draft.topic(), draft.platform());
    match &outcome.image {
        Ok(image) => println!("Image: {} ({} bytes)", image.mime_type, image.bytes.len()),
        Err(e) => print_image_failure(e),
    }
    println!("Caption: {}", draft.caption());
    let warning = if usage.near_limit { " [near limit]" } else { "" };
    println!("Characters: {}/{}{}", usage.length, usage.limit, warning);
    println!("Hashtags: {}", draft.hashtags_text());
    println!();
}

fn print_image_failure(error: &ImageError) {
    println!("Image failed: {error}");
    if error.is_retryable() {
        println!("Run again with --retry to try once more.");
    }
}

#[derive(Serialize)]
struct PostSummary<'a> {
    run_id: String,
    topic: &'a str,
    platform: Platform,
    caption: &'a str,
    hashtags: &'a [String],
    image_mime_type: Option<&'a str>,
    image_bytes: Option<usize>,
    image_error: Option<String>,
}

impl<'a> PostSummary<'a> {
    fn new(outcome: &'a GenerationOutcome, draft: &'a PostDraft) -> Self {
        let image = outcome.image.as_ref();
        Self {
            run_id: outcome.run_id.to_string(),
            topic: draft.topic(),
            platform: draft.platform(),
            caption: draft.caption(),
            hashtags: draft.hashtags(),
            image_mime_type: image.ok().map(|i| i.mime_type.as_str()),
            image_bytes: image.ok().map(|i| i.bytes.len()),
            image_error: image.err().map(ToString::to_string),
        }
    }
}
