//! Insight extraction — trending topics, top stories, hot discussions,
//! domain leaderboard, breakthrough detection, and the persisted charts
//! dataset and daily digest.
//!
//! Pure functions over the full cleaned+enriched batch. Each result is
//! deterministic: every sort has an explicit tie-break (original order
//! via stable sort, or name order where noted).

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use url::Url;

use crate::artifacts::{self, ArtifactPaths};
use crate::config::InsightsConfig;
use crate::models::{Enrichment, Story};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTrend {
    pub topic: String,
    pub count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopStory {
    pub title: String,
    pub summary: String,
    pub score: i64,
    pub num_comments: i64,
    pub hn_url: String,
    pub url: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakthrough {
    pub title: String,
    pub summary: String,
    pub score: i64,
    pub num_comments: i64,
    pub hn_url: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotDiscussion {
    pub title: String,
    pub score: i64,
    pub num_comments: i64,
    pub hn_url: String,
    /// Comments per point — discussion heat relative to votes.
    pub engagement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryTypeCount {
    pub story_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementBucket {
    pub bucket: String,
    pub count: usize,
}

/// Aggregates persisted for visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsData {
    pub trending_topics: Vec<TopicTrend>,
    pub comment_engagement: Vec<EngagementBucket>,
    pub hot_discussions: Vec<HotDiscussion>,
    pub story_types: Vec<StoryTypeCount>,
    pub domain_leaderboard: Vec<DomainCount>,
    pub score_distribution: Vec<i64>,
    pub generated_at: String,
}

/// The persisted daily digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDigest {
    pub date: String,
    pub total_stories: usize,
    pub breakthroughs: Vec<Breakthrough>,
    pub top_stories: Vec<TopStory>,
    pub trending_topics: Vec<TopicTrend>,
}

/// Group scores by topic label; a story contributes to every topic it
/// carries. Sorted by count descending, topic name ascending on ties.
pub fn trending_topics(stories: &[Story], topics: &[Vec<String>]) -> Vec<TopicTrend> {
    let mut scores_by_topic: HashMap<&str, Vec<i64>> = HashMap::new();

    for (story, story_topics) in stories.iter().zip(topics.iter()) {
        for topic in story_topics {
            scores_by_topic
                .entry(topic.as_str())
                .or_default()
                .push(story.score);
        }
    }

    let mut trends: Vec<TopicTrend> = scores_by_topic
        .into_iter()
        .map(|(topic, scores)| {
            let avg = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
            TopicTrend {
                topic: topic.to_string(),
                count: scores.len(),
                avg_score: (avg * 10.0).round() / 10.0,
            }
        })
        .collect();

    trends.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
    trends
}

/// Top-N stories by score, descending; ties keep original order.
pub fn top_stories(stories: &[Story], enrichment: &Enrichment, limit: usize) -> Vec<TopStory> {
    let mut indexed: Vec<(usize, &Story)> = stories.iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.score.cmp(&a.1.score));
    indexed.truncate(limit);

    indexed
        .into_iter()
        .map(|(i, story)| TopStory {
            title: story.title.clone(),
            summary: enrichment.summaries.get(i).cloned().unwrap_or_default(),
            score: story.score,
            num_comments: story.num_comments,
            hn_url: story.hn_url.clone(),
            url: story.url.clone(),
            topics: enrichment.topics.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Stories whose score clears the breakthrough threshold, descending.
pub fn detect_breakthroughs(
    stories: &[Story],
    enrichment: &Enrichment,
    threshold: i64,
) -> Vec<Breakthrough> {
    let mut breakthroughs: Vec<(usize, &Story)> = stories
        .iter()
        .enumerate()
        .filter(|(_, s)| s.score >= threshold)
        .collect();
    breakthroughs.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    breakthroughs
        .into_iter()
        .map(|(i, story)| Breakthrough {
            title: story.title.clone(),
            summary: enrichment.summaries.get(i).cloned().unwrap_or_default(),
            score: story.score,
            num_comments: story.num_comments,
            hn_url: story.hn_url.clone(),
            topics: enrichment.topics.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Stories with at least `floor` comments, ranked by comments-per-point.
pub fn hot_discussions(stories: &[Story], floor: i64, limit: usize) -> Vec<HotDiscussion> {
    let mut hot: Vec<HotDiscussion> = stories
        .iter()
        .filter(|s| s.num_comments >= floor)
        .map(|s| HotDiscussion {
            title: s.title.clone(),
            score: s.score,
            num_comments: s.num_comments,
            hn_url: s.hn_url.clone(),
            engagement: s.num_comments as f64 / s.score.max(1) as f64,
        })
        .collect();

    hot.sort_by(|a, b| {
        b.engagement
            .partial_cmp(&a.engagement)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hot.truncate(limit);
    hot
}

/// Count stories per external-URL host, `www.` stripped. Sorted by count
/// descending, domain name ascending on ties.
pub fn domain_leaderboard(stories: &[Story], limit: usize) -> Vec<DomainCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for story in stories {
        if story.url.is_empty() {
            continue;
        }
        let Ok(parsed) = Url::parse(&story.url) else {
            continue;
        };
        let Some(host) = parsed.host_str() else {
            continue;
        };
        let domain = host.strip_prefix("www.").unwrap_or(host).to_string();
        *counts.entry(domain).or_default() += 1;
    }

    let mut leaderboard: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();
    leaderboard.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    leaderboard.truncate(limit);
    leaderboard
}

const STORY_TYPE_PREFIXES: &[&str] = &["Show HN", "Ask HN", "Tell HN", "Launch HN"];

/// Classify stories by title prefix. Zero-count categories are omitted.
pub fn story_types(stories: &[Story]) -> Vec<StoryTypeCount> {
    let mut prefixed: Vec<usize> = vec![0; STORY_TYPE_PREFIXES.len()];
    let mut articles = 0usize;

    for story in stories {
        match STORY_TYPE_PREFIXES
            .iter()
            .position(|prefix| story.title.starts_with(prefix))
        {
            Some(slot) => prefixed[slot] += 1,
            None => articles += 1,
        }
    }

    let mut result = Vec::new();
    for (i, count) in prefixed.iter().enumerate() {
        if *count > 0 {
            result.push(StoryTypeCount {
                story_type: STORY_TYPE_PREFIXES[i].to_string(),
                count: *count,
            });
        }
    }
    if articles > 0 {
        result.push(StoryTypeCount {
            story_type: "Article".to_string(),
            count: articles,
        });
    }
    result
}

/// Comment-count buckets for engagement analysis.
pub fn comment_engagement(stories: &[Story]) -> Vec<EngagementBucket> {
    let bounds: &[(&str, i64, i64)] = &[
        ("0-10", 0, 10),
        ("11-50", 11, 50),
        ("51-100", 51, 100),
        ("101-250", 101, 250),
        ("250+", 251, i64::MAX),
    ];

    bounds
        .iter()
        .map(|(label, lo, hi)| EngagementBucket {
            bucket: (*label).to_string(),
            count: stories
                .iter()
                .filter(|s| s.num_comments >= *lo && s.num_comments <= *hi)
                .count(),
        })
        .collect()
}

/// Raw score list for histogramming.
pub fn score_distribution(stories: &[Story]) -> Vec<i64> {
    stories.iter().map(|s| s.score).collect()
}

/// Compute and persist the charts dataset.
pub fn write_charts_data(
    stories: &[Story],
    enrichment: &Enrichment,
    config: &InsightsConfig,
    paths: &ArtifactPaths,
) -> Result<ChartsData> {
    let charts = ChartsData {
        trending_topics: trending_topics(stories, &enrichment.topics),
        comment_engagement: comment_engagement(stories),
        hot_discussions: hot_discussions(stories, config.hot_comment_floor, config.hot_limit),
        story_types: story_types(stories),
        domain_leaderboard: domain_leaderboard(stories, config.domain_limit),
        score_distribution: score_distribution(stories),
        generated_at: Utc::now().to_rfc3339(),
    };

    artifacts::write_json_atomic(&paths.charts(), &charts)?;
    info!(path = %paths.charts().display(), "Charts data saved");
    Ok(charts)
}

/// Compute and persist the daily digest.
pub fn write_daily_digest(
    stories: &[Story],
    enrichment: &Enrichment,
    config: &InsightsConfig,
    paths: &ArtifactPaths,
) -> Result<DailyDigest> {
    let mut breakthroughs = detect_breakthroughs(stories, enrichment, config.breakthrough_score);
    breakthroughs.truncate(5);

    let digest = DailyDigest {
        date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        total_stories: stories.len(),
        breakthroughs,
        top_stories: top_stories(stories, enrichment, config.top_stories_limit),
        trending_topics: trending_topics(stories, &enrichment.topics),
    };

    artifacts::write_json_atomic(&paths.digest(), &digest)?;
    info!(path = %paths.digest().display(), "Daily digest saved");
    Ok(digest)
}
