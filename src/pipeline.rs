//! Batch-cycle orchestration: collect → clean → enrich → index → insights.
//!
//! Runs once per cycle (typically daily). Fatal errors abort the cycle
//! before the index/metadata pair is replaced, leaving the previous
//! run's artifacts untouched and queryable.

use anyhow::{ensure, Result};
use tracing::info;

use crate::artifacts::ArtifactPaths;
use crate::clean;
use crate::collect;
use crate::config::Config;
use crate::embedding::{EmbeddingClient, OpenAiEmbeddings};
use crate::enrich;
use crate::hn::HnClient;
use crate::index;
use crate::insights;
use crate::llm::{ChatClient, OpenAiChat};
use crate::models::RawStory;

/// Run the full batch cycle against the live services.
pub async fn run_pipeline(config: &Config, fetch_comments: bool) -> Result<()> {
    let paths = ArtifactPaths::new(config);
    paths.ensure_dirs()?;

    info!("Step 1/5: Collecting stories");
    let client = HnClient::new(&config.hn)?;
    let raw = collect::collect_stories(&client, config, &paths, fetch_comments).await?;
    ensure!(!raw.is_empty(), "No stories collected — aborting batch");

    let llm = OpenAiChat::new(&config.llm)?;
    let embedder = OpenAiEmbeddings::new(&config.embedding)?;

    run_batch(&raw, &llm, &embedder, config, &paths).await
}

/// Run the post-collection stages over an already-collected raw
/// sequence. Split out so the cycle can be driven from a snapshot or,
/// in tests, with injected clients.
pub async fn run_batch(
    raw: &[RawStory],
    llm: &dyn ChatClient,
    embedder: &dyn EmbeddingClient,
    config: &Config,
    paths: &ArtifactPaths,
) -> Result<()> {
    info!("Step 2/5: Cleaning stories");
    let stories = clean::clean_stories(raw, config.hn.min_score);
    ensure!(
        !stories.is_empty(),
        "No stories survived cleaning — aborting batch"
    );

    info!("Step 3/5: Enriching stories");
    let enrichment = enrich::enrich(&stories, llm, embedder, config).await?;

    info!("Step 4/5: Building index");
    index::build_index(&stories, &enrichment, config, paths)?;

    info!("Step 5/5: Generating insights");
    insights::write_charts_data(&stories, &enrichment, &config.insights, paths)?;
    insights::write_daily_digest(&stories, &enrichment, &config.insights, paths)?;

    info!(stories = stories.len(), "Batch cycle complete");
    Ok(())
}
