//! Story collection — front page plus topic searches, deduplicated.
//!
//! The front-page fetch is the backbone of the corpus: if it fails, the
//! whole collection aborts. Each topic search is best-effort — a failed
//! query is logged and skipped. Deduplication is by object id across all
//! fetches, keeping the first occurrence, and the output preserves
//! first-seen order. The full deduplicated sequence is persisted as a
//! dated raw snapshot before being returned.

use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::artifacts::{self, ArtifactPaths};
use crate::config::Config;
use crate::gather;
use crate::hn::{self, HnClient, StoryHit};
use crate::models::{Comment, RawStory};

pub async fn collect_stories(
    client: &HnClient,
    config: &Config,
    paths: &ArtifactPaths,
    fetch_comments: bool,
) -> Result<Vec<RawStory>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits: Vec<StoryHit> = Vec::new();

    // Front page — no meaningful corpus without it.
    info!("Fetching HN front page");
    let front = client
        .front_page(config.hn.front_page_hits)
        .await
        .context("Front-page fetch failed; aborting collection")?;
    for hit in front {
        if !hit.object_id.is_empty() && seen.insert(hit.object_id.clone()) {
            hits.push(hit);
        }
    }
    info!(stories = hits.len(), "Front page fetched");

    // Topic searches — partial-failure tolerant.
    for query in &config.hn.topic_queries {
        match client
            .search_recent(query, config.hn.search_hits_per_query)
            .await
        {
            Ok(results) => {
                let mut added = 0usize;
                for hit in results {
                    if !hit.object_id.is_empty() && seen.insert(hit.object_id.clone()) {
                        hits.push(hit);
                        added += 1;
                    }
                }
                info!(query = query.as_str(), added, "Topic search done");
            }
            Err(e) => {
                warn!(query = query.as_str(), error = %e, "Topic search failed, skipping");
            }
        }
    }

    // Comment fan-out: bounded concurrency, gathered back into submission
    // order via index tags. A failed fetch degrades to no comments.
    let comments = if fetch_comments {
        fetch_all_comments(client, &hits, config).await
    } else {
        vec![Vec::new(); hits.len()]
    };

    let stories: Vec<RawStory> = hits
        .into_iter()
        .zip(comments)
        .map(|(hit, comments)| hn::raw_story_from_hit(hit, comments))
        .collect();

    // Persist the dated raw snapshot for audit/replay.
    let today = chrono::Utc::now().date_naive();
    let snapshot_path = paths.raw_snapshot(today);
    artifacts::write_json_atomic(&snapshot_path, &stories)
        .with_context(|| format!("Failed to write raw snapshot {}", snapshot_path.display()))?;
    info!(
        stories = stories.len(),
        path = %snapshot_path.display(),
        "Raw snapshot saved"
    );

    Ok(stories)
}

async fn fetch_all_comments(
    client: &HnClient,
    hits: &[StoryHit],
    config: &Config,
) -> Vec<Vec<Comment>> {
    let max = config.hn.top_comments;
    gather::map_ordered(hits, config.enrich.workers, |_, hit| async move {
        match client.top_comments(&hit.object_id, max).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(story = hit.object_id.as_str(), error = %e, "Comment fetch failed");
                Vec::new()
            }
        }
    })
    .await
}
