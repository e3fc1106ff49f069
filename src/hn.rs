//! Hacker News client over the public Algolia search API.
//!
//! No authentication is required. Three endpoints are used:
//! - `GET /search?tags=front_page` — current front-page stories
//! - `GET /search_by_date?query=...&tags=story` — recent stories by keyword
//! - `GET /items/{id}` — a story with its top-level comment tree
//!
//! Responses are mapped into [`RawStory`] / [`Comment`] before anything
//! downstream sees them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::HnConfig;
use crate::models::{Comment, RawStory};

const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

/// An Algolia search hit for a story.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub story_text: Option<String>,
    pub points: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_at_i: Option<i64>,
    pub author: Option<String>,
    #[serde(rename = "_tags", default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<StoryHit>,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    children: Vec<ItemChild>,
}

#[derive(Debug, Deserialize)]
struct ItemChild {
    text: Option<String>,
    author: Option<String>,
}

/// HTTP client for the Algolia HN API.
pub struct HnClient {
    http: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub fn new(config: &HnConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current front-page stories.
    pub async fn front_page(&self, hits_per_page: usize) -> Result<Vec<StoryHit>> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("tags", "front_page"),
                ("hitsPerPage", &hits_per_page.to_string()),
            ])
            .send()
            .await
            .context("Front-page request failed")?
            .error_for_status()
            .context("Front-page request returned an error status")?;

        let body: SearchResponse = resp.json().await.context("Invalid front-page response")?;
        debug!(hits = body.hits.len(), "Fetched front page");
        Ok(body.hits)
    }

    /// Search recent stories by keyword.
    pub async fn search_recent(&self, query: &str, hits_per_page: usize) -> Result<Vec<StoryHit>> {
        let url = format!("{}/search_by_date", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", &hits_per_page.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Search request failed for '{}'", query))?
            .error_for_status()
            .with_context(|| format!("Search returned an error status for '{}'", query))?;

        let body: SearchResponse = resp.json().await.context("Invalid search response")?;
        debug!(query, hits = body.hits.len(), "Searched recent stories");
        Ok(body.hits)
    }

    /// Fetch up to `max` top-level comments for a story. Comments without
    /// a body or a known author are skipped.
    pub async fn top_comments(&self, object_id: &str, max: usize) -> Result<Vec<Comment>> {
        let url = format!("{}/items/{}", self.base_url, object_id);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Item request failed for {}", object_id))?
            .error_for_status()
            .with_context(|| format!("Item request returned an error status for {}", object_id))?;

        let body: ItemResponse = resp.json().await.context("Invalid item response")?;

        let comments = body
            .children
            .into_iter()
            .take(max)
            .filter_map(|child| match (child.text, child.author) {
                (Some(body), Some(author)) if !body.is_empty() => {
                    Some(Comment { author, body })
                }
                _ => None,
            })
            .collect();

        Ok(comments)
    }
}

/// Convert an Algolia hit into a [`RawStory`].
pub fn raw_story_from_hit(hit: StoryHit, comments: Vec<Comment>) -> RawStory {
    let source_tag = hit
        .tags
        .first()
        .cloned()
        .unwrap_or_else(|| "story".to_string());

    RawStory {
        id: hit.object_id,
        title: hit.title.unwrap_or_default(),
        url: hit.url.unwrap_or_default(),
        text: hit.story_text.unwrap_or_default(),
        score: hit.points.unwrap_or(0),
        num_comments: hit.num_comments.unwrap_or(0),
        created_at: hit.created_at_i.unwrap_or(0),
        author: hit.author.unwrap_or_default(),
        source_tag,
        top_comments: comments,
    }
}

/// Permalink to the HN discussion page for a story id.
pub fn permalink(object_id: &str) -> String {
    format!("{}{}", ITEM_URL, object_id)
}
