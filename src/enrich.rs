//! Concurrent story enrichment — summaries, topic labels, embeddings.
//!
//! Three derivations over the same assembled text, one output per input
//! story, in input order:
//!
//! - **Summarization** — one LLM call per story through a bounded worker
//!   pool; a failed call falls back to the story title.
//! - **Topic classification** — pure keyword matching, no external call.
//! - **Embedding** — batched calls to the embedding backend.
//!
//! The gather step reassembles pooled results into submission order by
//! index tag. Everything downstream (index rows, metadata rows) assumes
//! output i refers to story i; this module enforces that before
//! returning.

use anyhow::{ensure, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::gather;
use crate::llm::ChatClient;
use crate::models::{ChatMessage, Enrichment, Story};

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a concise tech news summarizer. Summarize the \
     following Hacker News story in 2-3 sentences, focusing on the key technical insight or news.";

const BODY_CHARS: usize = 500;
const COMMENT_CHARS: usize = 200;
const COMMENTS_USED: usize = 3;
const SUMMARY_INPUT_CHARS: usize = 2000;
const EMBED_INPUT_CHARS: usize = 8000;

/// Topic → keyword list, matched case-insensitively as substrings.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "AI/ML",
        &[
            "ai",
            "machine learning",
            "deep learning",
            "neural",
            "llm",
            "gpt",
            "transformer",
            "diffusion",
            "generative",
        ],
    ),
    (
        "Web Development",
        &[
            "javascript", "react", "vue", "angular", "frontend", "backend", "web", "css", "html",
            "node",
        ],
    ),
    (
        "Cloud/Infra",
        &[
            "aws",
            "cloud",
            "docker",
            "kubernetes",
            "devops",
            "terraform",
            "ci/cd",
            "infrastructure",
        ],
    ),
    (
        "Security",
        &[
            "security",
            "vulnerability",
            "exploit",
            "encryption",
            "privacy",
            "hack",
            "breach",
            "zero-day",
        ],
    ),
    (
        "Programming Languages",
        &[
            "rust",
            "python",
            "golang",
            "java",
            "typescript",
            "compiler",
            "language",
        ],
    ),
    (
        "Data/Analytics",
        &[
            "data",
            "analytics",
            "database",
            "sql",
            "spark",
            "pipeline",
            "etl",
            "warehouse",
        ],
    ),
    (
        "Open Source",
        &[
            "open source",
            "oss",
            "github",
            "repository",
            "fork",
            "release",
            "license",
        ],
    ),
    (
        "Hardware/Chips",
        &[
            "chip",
            "gpu",
            "cpu",
            "hardware",
            "semiconductor",
            "nvidia",
            "amd",
            "intel",
            "quantum",
        ],
    ),
    (
        "Startups",
        &[
            "startup",
            "funding",
            "yc",
            "seed",
            "series a",
            "acquisition",
            "ipo",
            "valuation",
        ],
    ),
];

/// Sentinel label for stories matching no topic keywords.
pub const GENERAL_TOPIC: &str = "General";

/// Run all three derivations and return index-aligned outputs.
pub async fn enrich(
    stories: &[Story],
    llm: &dyn ChatClient,
    embedder: &dyn EmbeddingClient,
    config: &Config,
) -> Result<Enrichment> {
    ensure!(
        embedder.dims() == config.embedding.dims,
        "Embedding backend produces {} dims, config expects {}",
        embedder.dims(),
        config.embedding.dims
    );

    info!(
        stories = stories.len(),
        workers = config.enrich.workers,
        "Enriching stories"
    );

    let summaries = summarize_all(stories, llm, config).await;

    let embed_inputs: Vec<String> = stories
        .iter()
        .map(|s| truncate_chars(&story_text(s), EMBED_INPUT_CHARS).to_string())
        .collect();
    let embeddings = embedder.embed(&embed_inputs).await?;

    let topics: Vec<Vec<String>> = stories
        .iter()
        .map(|s| classify_topics(&story_text(s)))
        .collect();

    ensure!(
        summaries.len() == stories.len()
            && embeddings.len() == stories.len()
            && topics.len() == stories.len(),
        "Enrichment output misaligned: {} stories, {} summaries, {} embeddings, {} topic sets",
        stories.len(),
        summaries.len(),
        embeddings.len(),
        topics.len()
    );

    Ok(Enrichment {
        summaries,
        embeddings,
        topics,
    })
}

/// Summarize every story with bounded parallelism, gathering results
/// back into submission order. A failed call degrades to the title.
async fn summarize_all(stories: &[Story], llm: &dyn ChatClient, config: &Config) -> Vec<String> {
    gather::map_ordered(stories, config.enrich.workers, |_, story| async move {
        summarize_one(story, llm, config).await
    })
    .await
}

async fn summarize_one(story: &Story, llm: &dyn ChatClient, config: &Config) -> String {
    let text = story_text(story);
    let messages = [
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(truncate_chars(&text, SUMMARY_INPUT_CHARS)),
    ];

    match llm
        .complete(
            &messages,
            config.llm.summary_temperature,
            Some(config.llm.summary_max_tokens),
        )
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            warn!(story = story.id.as_str(), error = %e, "Summarization failed, using title");
            story.title.clone()
        }
    }
}

/// Combine title, truncated body, and top comment bodies into the text
/// all three derivations run over.
pub fn story_text(story: &Story) -> String {
    let mut parts = vec![story.title.clone()];
    if !story.text.is_empty() {
        parts.push(truncate_chars(&story.text, BODY_CHARS).to_string());
    }
    for comment in story.top_comments.iter().take(COMMENTS_USED) {
        parts.push(truncate_chars(&comment.body, COMMENT_CHARS).to_string());
    }
    parts.join("\n")
}

/// Keyword-based topic classification. A story with no keyword hits gets
/// the single [`GENERAL_TOPIC`] sentinel.
pub fn classify_topics(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut topics: Vec<String> = Vec::new();

    for (topic, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            topics.push((*topic).to_string());
        }
    }

    if topics.is_empty() {
        topics.push(GENERAL_TOPIC.to_string());
    }
    topics
}

/// Truncate at a char boundary, never mid-codepoint.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::l2_normalize;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::time::Duration;

    fn story(id: &str, title: &str) -> Story {
        Story {
            id: id.to_string(),
            title: title.to_string(),
            url: String::new(),
            text: String::new(),
            score: 100,
            num_comments: 10,
            created_at: 0,
            author: "tester".to_string(),
            hn_url: format!("https://news.ycombinator.com/item?id={}", id),
            top_comments: vec![],
        }
    }

    /// Echoes the story title back as the summary, after a delay that
    /// scrambles completion order relative to submission order.
    struct ScrambledLlm;

    #[async_trait]
    impl ChatClient for ScrambledLlm {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: Option<u32>,
        ) -> anyhow::Result<String> {
            let text = messages.last().unwrap().content.clone();
            let first_line = text.lines().next().unwrap_or("").to_string();
            let delay = (first_line.len() % 4) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("summary of {}", first_line))
        }
    }

    /// Fails for one specific story title, succeeds otherwise.
    struct FlakyLlm;

    #[async_trait]
    impl ChatClient for FlakyLlm {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: Option<u32>,
        ) -> anyhow::Result<String> {
            let text = &messages.last().unwrap().content;
            if text.contains("doomed") {
                bail!("simulated provider failure");
            }
            Ok("ok".to_string())
        }
    }

    struct HashEmbedder;

    #[async_trait]
    impl crate::embedding::EmbeddingClient for HashEmbedder {
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![t.len() as f32, 1.0, 0.5, 0.25];
                    l2_normalize(&mut v);
                    v
                })
                .collect())
        }

        fn dims(&self) -> usize {
            4
        }
    }

    #[test]
    fn test_classify_matches_keywords() {
        let topics = classify_topics("A new LLM beats GPT on reasoning benchmarks");
        assert!(topics.contains(&"AI/ML".to_string()));
    }

    #[test]
    fn test_classify_multiple_topics() {
        let topics = classify_topics("Rust rewrite of a Kubernetes controller");
        assert!(topics.contains(&"Programming Languages".to_string()));
        assert!(topics.contains(&"Cloud/Infra".to_string()));
    }

    #[test]
    fn test_classify_sentinel_when_no_hits() {
        let topics = classify_topics("zzz qqq xyzzy");
        assert_eq!(topics, vec![GENERAL_TOPIC.to_string()]);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_chars(text, 4);
        assert_eq!(cut, "héll");
    }

    #[test]
    fn test_story_text_includes_comments() {
        let mut s = story("1", "Title here");
        s.text = "Body text".to_string();
        s.top_comments = vec![
            crate::models::Comment {
                author: "a".to_string(),
                body: "first comment".to_string(),
            };
            5
        ];
        let text = story_text(&s);
        assert!(text.starts_with("Title here\nBody text"));
        // Only the first three comments are used
        assert_eq!(text.matches("first comment").count(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_summaries_gathered_in_input_order() {
        let stories: Vec<Story> = (0..16)
            .map(|i| story(&i.to_string(), &format!("Story number {}", i)))
            .collect();
        let config = Config::default();

        let summaries = summarize_all(&stories, &ScrambledLlm, &config).await;

        assert_eq!(summaries.len(), stories.len());
        for (i, summary) in summaries.iter().enumerate() {
            assert_eq!(summary, &format!("summary of Story number {}", i));
        }
    }

    #[tokio::test]
    async fn test_failed_summary_falls_back_to_title() {
        let stories = vec![
            story("1", "A fine story"),
            story("2", "The doomed story"),
            story("3", "Another fine story"),
        ];
        let config = Config::default();

        let summaries = summarize_all(&stories, &FlakyLlm, &config).await;

        assert_eq!(summaries[0], "ok");
        assert_eq!(summaries[1], "The doomed story");
        assert_eq!(summaries[2], "ok");
    }

    #[tokio::test]
    async fn test_enrich_rejects_mismatched_backend_dims() {
        let stories = vec![story("1", "A story")];
        // Default config expects 1536 dims; the mock backend produces 4
        let config = Config::default();

        let result = enrich(&stories, &ScrambledLlm, &HashEmbedder, &config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_enrich_outputs_aligned() {
        let stories: Vec<Story> = (0..5)
            .map(|i| story(&i.to_string(), &format!("Rust story {}", i)))
            .collect();
        let mut config = Config::default();
        config.embedding.dims = HashEmbedder.dims();

        let enrichment = enrich(&stories, &ScrambledLlm, &HashEmbedder, &config)
            .await
            .unwrap();

        assert_eq!(enrichment.summaries.len(), 5);
        assert_eq!(enrichment.embeddings.len(), 5);
        assert_eq!(enrichment.topics.len(), 5);
        for topics in &enrichment.topics {
            assert!(topics.contains(&"Programming Languages".to_string()));
        }
    }
}
