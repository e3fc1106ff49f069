//! Story cleaning — dedup, low-score filtering, text normalization.
//!
//! Deterministic and order-preserving: the same raw sequence always
//! produces the same cleaned sequence in the same relative order, which
//! the downstream index/metadata alignment depends on.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::info;

use crate::hn;
use crate::models::{RawStory, Story};

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&\w+;").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip markup tags and entities, collapse whitespace, and trim.
pub fn normalize_text(text: &str) -> String {
    let text = RE_TAG.replace_all(text, " ");
    let text = RE_ENTITY.replace_all(&text, " ");
    let text = RE_WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Filter and deduplicate raw stories into canonical [`Story`] records.
///
/// Drops stories with an empty title or a score below `min_score`.
/// Deduplicates by id, first occurrence wins.
pub fn clean_stories(raw: &[RawStory], min_score: i64) -> Vec<Story> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut cleaned: Vec<Story> = Vec::new();

    for story in raw {
        if story.title.is_empty() {
            continue;
        }

        if story.score < min_score {
            continue;
        }

        if !seen.insert(&story.id) {
            continue;
        }

        let title = normalize_text(&story.title);
        if title.is_empty() {
            continue;
        }

        cleaned.push(Story {
            id: story.id.clone(),
            title,
            url: story.url.clone(),
            text: normalize_text(&story.text),
            score: story.score,
            num_comments: story.num_comments,
            created_at: story.created_at,
            author: story.author.clone(),
            hn_url: hn::permalink(&story.id),
            top_comments: story
                .top_comments
                .iter()
                .map(|c| crate::models::Comment {
                    author: c.author.clone(),
                    body: normalize_text(&c.body),
                })
                .collect(),
        });
    }

    info!(raw = raw.len(), cleaned = cleaned.len(), "Cleaned stories");
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn raw(id: &str, title: &str, score: i64) -> RawStory {
        RawStory {
            id: id.to_string(),
            title: title.to_string(),
            url: String::new(),
            text: String::new(),
            score,
            num_comments: 0,
            created_at: 0,
            author: "tester".to_string(),
            source_tag: "story".to_string(),
            top_comments: vec![],
        }
    }

    #[test]
    fn test_normalize_strips_tags_and_entities() {
        let text = "<p>Hello&nbsp;world</p>  and <a href=\"x\">links</a>";
        assert_eq!(normalize_text(text), "Hello world and links");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a\n\n  b\t c  "), "a b c");
    }

    #[test]
    fn test_drops_empty_title_and_low_score() {
        let input = vec![raw("1", "", 100), raw("2", "Kept", 100), raw("3", "Low", 5)];
        let out = clean_stories(&input, 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "2");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let input = vec![
            raw("1", "First copy", 50),
            raw("2", "Other", 50),
            raw("1", "Second copy", 999),
        ];
        let out = clean_stories(&input, 10);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "First copy");
        assert_eq!(out[1].id, "2");
    }

    #[test]
    fn test_order_preserved() {
        let input: Vec<RawStory> = (0..20)
            .map(|i| raw(&i.to_string(), &format!("Story {}", i), 100))
            .collect();
        let out = clean_stories(&input, 10);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            raw("1", "<b>Bold</b> title", 50),
            raw("2", "Plain", 50),
            raw("1", "Dup", 50),
        ];
        let once = clean_stories(&input, 10);

        // Feed the cleaned output back through as raw stories.
        let as_raw: Vec<RawStory> = once
            .iter()
            .map(|s| RawStory {
                id: s.id.clone(),
                title: s.title.clone(),
                url: s.url.clone(),
                text: s.text.clone(),
                score: s.score,
                num_comments: s.num_comments,
                created_at: s.created_at,
                author: s.author.clone(),
                source_tag: "story".to_string(),
                top_comments: s.top_comments.clone(),
            })
            .collect();
        let twice = clean_stories(&as_raw, 10);

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.title, b.title);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_comment_bodies_normalized() {
        let mut story = raw("1", "Title", 50);
        story.top_comments.push(Comment {
            author: "alice".to_string(),
            body: "<i>nested</i>&amp; markup".to_string(),
        });
        let out = clean_stories(&[story], 10);
        assert_eq!(out[0].top_comments[0].body, "nested markup");
    }
}
