//! # news-radar
//!
//! A daily Hacker News ingestion, insight, and retrieval-augmented
//! briefing engine.
//!
//! Once per batch cycle, news-radar collects front-page and topic-search
//! stories from the public Algolia HN API, cleans and deduplicates them,
//! enriches each story with an LLM summary, a keyword topic set, and a
//! normalized embedding, builds an inner-product vector index with an
//! index-aligned metadata store, and derives aggregate insights (daily
//! digest + charts dataset). At query time it embeds the question,
//! searches the persisted index, and generates a conversational,
//! source-cited answer, optionally conditioned on prior turns.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌────────────────┐   ┌─────────────┐
//! │ Collector │──▶│ Cleaner │──▶│    Enricher     │──▶│ Index + Meta │
//! │ HN/Algolia│   │         │   │ sum/topic/embed │   │  (aligned)   │
//! └───────────┘   └─────────┘   └────────────────┘   └──────┬──────┘
//!                                      │                    │
//!                                      ▼                    ▼
//!                               ┌────────────┐       ┌─────────────┐
//!                               │  Insights  │       │  Retriever   │
//!                               │ digest+... │       │  → Answerer  │
//!                               └────────────┘       └─────────────┘
//! ```
//!
//! The batch half runs via `radar pipeline`; the query half via
//! `radar ask`, `radar chat`, and `radar search`.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`artifacts`] | On-disk layout and atomic file replacement |
//! | [`hn`] | Algolia HN API client |
//! | [`collect`] | Deduplicating story collection + raw snapshot |
//! | [`clean`] | Filtering and text normalization |
//! | [`enrich`] | Concurrent summarization, topics, embeddings |
//! | [`gather`] | Ordered bounded-concurrency map |
//! | [`embedding`] | Embedding backend abstraction |
//! | [`llm`] | Chat-completion backend abstraction |
//! | [`index`] | Vector index and index/metadata pair builder |
//! | [`insights`] | Aggregate insights, digest, charts dataset |
//! | [`retrieve`] | Query-time retrieval context and search |
//! | [`agent`] | Retrieval-conditioned answer generation |
//! | [`pipeline`] | Batch-cycle orchestration |

pub mod agent;
pub mod artifacts;
pub mod clean;
pub mod collect;
pub mod config;
pub mod embedding;
pub mod enrich;
pub mod gather;
pub mod hn;
pub mod index;
pub mod insights;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod retrieve;
