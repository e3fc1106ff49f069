//! Core data models used throughout news-radar.
//!
//! These types represent the stories, enrichment outputs, and chat turns
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// A top-level comment kept alongside a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
}

/// Raw story as fetched from the Algolia API, before cleaning.
/// Written verbatim into the dated raw snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStory {
    pub id: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_at: i64,
    pub author: String,
    pub source_tag: String,
    pub top_comments: Vec<Comment>,
}

/// Canonical cleaned story. Identifier is unique within a batch, the
/// title is non-empty, and all text fields are normalized exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_at: i64,
    pub author: String,
    pub hn_url: String,
    pub top_comments: Vec<Comment>,
}

/// Per-story enrichment outputs, each index-aligned with the input
/// stories. Row i of every field refers to story i — the vector index
/// and metadata store are built from these in the same order.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub summaries: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub topics: Vec<Vec<String>>,
}

/// Metadata record persisted per index row. Row N of the metadata store
/// describes the story whose embedding sits at index row N.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub score: i64,
    pub num_comments: i64,
    pub hn_url: String,
    pub url: String,
    pub topics: Vec<String>,
    pub snippet: String,
}

/// A metadata record paired with its similarity score from the index.
#[derive(Debug, Clone)]
pub struct RetrievedStory {
    pub record: StoryRecord,
    pub relevance: f32,
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged turn. Conversation history is owned by the
/// caller and passed by slice; the agent never mutates or stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
