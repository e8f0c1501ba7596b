use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use placescout_common::Config;
use placescout_merge::DEFAULT_MATCH_THRESHOLD;
use placescout_pipeline::pipeline::{self, PipelineOptions};

/// Aggregate business listings from maps search, review sites, and LLM
/// research into one deduplicated spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "placescout")]
struct Cli {
    /// What data to collect, e.g. "all spas in Hyderabad with pricing"
    requirement: String,

    /// Number of Google Maps search queries to generate
    #[arg(long, default_value_t = 3)]
    queries: usize,

    /// Maximum results per maps query
    #[arg(long, default_value_t = 40)]
    results_per_query: usize,

    /// Maximum listings to enrich with place details
    #[arg(long, default_value_t = 20)]
    max_place_details: usize,

    /// Also search Yelp
    #[arg(long)]
    yelp: bool,

    /// Also search the Google local pack
    #[arg(long)]
    local: bool,

    /// Skip the LLM research stages
    #[arg(long)]
    no_research: bool,

    /// Pairwise match threshold for the merge engine
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    threshold: f64,

    /// Directory for the exported spreadsheet
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("PlaceScout starting...");
    let config = Config::from_env();
    config.log_redacted();

    let options = PipelineOptions {
        requirement: cli.requirement,
        num_queries: cli.queries,
        results_per_query: cli.results_per_query,
        max_place_details: cli.max_place_details,
        include_yelp: cli.yelp,
        include_local: cli.local,
        skip_research: cli.no_research,
        match_threshold: cli.threshold,
        output_dir: cli.output,
    };

    let path = pipeline::run(&config, &options).await?;
    info!(path = %path.display(), "Run complete");
    println!("{}", path.display());

    Ok(())
}
