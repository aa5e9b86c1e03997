//! BrandLens pipeline CLI
//!
//! Collects LLM responses for a fixed marketing-research query battery,
//! extracts brand mentions, and assembles the wide analytic dataset.
//! Collection is resumable: rerunning `collect` picks up where the last
//! run stopped.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brandlens_collector::{load_queries, CheckpointStore, CollectionDriver, CollectorConfig};
use brandlens_core::{CompletionEndpoint, Provider, ProviderConfig};
use brandlens_dataset::{assemble, extract_mentions_file, AssembleInputs, BrandPatterns};
use brandlens_gemini::GeminiEndpoint;
use brandlens_openai::OpenAiEndpoint;

/// BrandLens - LLM brand-visibility data pipeline
#[derive(Parser, Debug)]
#[command(name = "brandlens")]
#[command(version)]
#[command(about = "Collects LLM responses and assembles the brand-visibility dataset", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a provider credential with a minimal-cost liveness probe
    Probe(ProbeArgs),

    /// Collect responses for the query battery, resuming from any existing output
    Collect(CollectArgs),

    /// Extract per-brand mention flags from a responses file
    Extract(ExtractArgs),

    /// Assemble the wide analytic dataset from responses, mentions, and brand metrics
    Assemble(AssembleArgs),
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Provider to probe (openai | gemini)
    provider: Provider,

    /// Model override
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Provider to collect from (openai | gemini)
    provider: Provider,

    /// Query battery CSV (query_id, query_text, topic)
    #[arg(long, default_value = "queries.csv")]
    queries: PathBuf,

    /// Output/checkpoint CSV; defaults to responses_<source>.csv
    #[arg(long)]
    output: Option<PathBuf>,

    /// Model override
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Responses CSV to scan
    #[arg(long, default_value = "responses.csv")]
    responses: PathBuf,

    /// Long-format mentions output
    #[arg(long, default_value = "mentions.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    #[arg(long, default_value = "data/responses_chatgpt.csv")]
    responses_chatgpt: PathBuf,

    #[arg(long, default_value = "data/responses_gemini.csv")]
    responses_gemini: PathBuf,

    #[arg(long, default_value = "data/mentions_chatgpt.csv")]
    mentions_chatgpt: PathBuf,

    #[arg(long, default_value = "data/mentions_gemini.csv")]
    mentions_gemini: PathBuf,

    #[arg(long, default_value = "data/brand_features.csv")]
    brand_features: PathBuf,

    #[arg(long, default_value = "data/topic_brand_hits.csv")]
    topic_hits: PathBuf,

    #[arg(long, default_value = "data/dataset.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Probe(args) => run_probe(args).await,
        Commands::Collect(args) => run_collect(args).await,
        Commands::Extract(args) => run_extract(args),
        Commands::Assemble(args) => run_assemble(args),
    }
}

fn build_endpoint(
    provider: Provider,
    model: Option<String>,
) -> anyhow::Result<Arc<dyn CompletionEndpoint>> {
    let mut config = ProviderConfig::from_env(provider)?;
    if let Some(model) = model {
        config = config.with_model(model);
    }

    let endpoint: Arc<dyn CompletionEndpoint> = match provider {
        Provider::OpenAi => Arc::new(OpenAiEndpoint::new(config)),
        Provider::Gemini => Arc::new(GeminiEndpoint::new(config)?),
    };

    Ok(endpoint)
}

async fn run_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let provider = args.provider;
    let endpoint = build_endpoint(provider, args.model)?;

    info!("Probing {}...", provider);
    match endpoint.probe().await {
        Ok(()) => {
            info!("{} credential is live", provider);
            Ok(())
        }
        Err(err) => {
            error!("{} probe failed: {}", provider, err.message);
            error!(
                "Likely causes: expired or invalid API key, exhausted quota or billing, \
                 or the API not enabled for this credential"
            );
            anyhow::bail!("{} probe failed: {}", provider, err.message)
        }
    }
}

async fn run_collect(args: CollectArgs) -> anyhow::Result<()> {
    let provider = args.provider;
    let endpoint = build_endpoint(provider, args.model)?;

    let queries = load_queries(&args.queries)
        .with_context(|| format!("loading query battery from {}", args.queries.display()))?;

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!("responses_{}.csv", provider.source_tag()))
    });

    let store = CheckpointStore::new(&output);
    let driver = CollectionDriver::new(endpoint, store, CollectorConfig::default());

    let summary = driver.run(&queries).await?;

    info!(
        "Collected {} responses ({} failed, {} already done); saved to {}",
        summary.completed,
        summary.failed,
        summary.skipped,
        output.display()
    );

    Ok(())
}

fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let patterns = BrandPatterns::default_brands();
    let written = extract_mentions_file(&args.responses, &args.output, &patterns)
        .with_context(|| format!("extracting mentions from {}", args.responses.display()))?;

    info!("Wrote {} mention rows to {}", written, args.output.display());
    Ok(())
}

fn run_assemble(args: AssembleArgs) -> anyhow::Result<()> {
    let inputs = AssembleInputs {
        responses_chatgpt: args.responses_chatgpt,
        responses_gemini: args.responses_gemini,
        mentions_chatgpt: args.mentions_chatgpt,
        mentions_gemini: args.mentions_gemini,
        brand_features: args.brand_features,
        topic_hits: args.topic_hits,
        output: args.output.clone(),
    };

    let rows = assemble(&inputs).context("assembling the analytic dataset")?;

    info!("Dataset ready: {} rows in {}", rows, args.output.display());
    Ok(())
}
