//! Query-time retrieval against the persisted index/metadata pair.
//!
//! [`QueryContext`] is the explicit handle bundle for the query path —
//! the loaded index, the metadata records, and the external-service
//! clients — constructed once at startup and passed into every call.
//! Artifacts are read-only here; the batch cycle replaces them only by
//! atomic rename, so an in-flight query never sees a partial write.

use anyhow::{ensure, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifacts::{self, ArtifactPaths};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, OpenAiEmbeddings};
use crate::index::VectorIndex;
use crate::llm::{ChatClient, OpenAiChat};
use crate::models::{RetrievedStory, StoryRecord};

pub struct QueryContext {
    pub config: Config,
    pub index: VectorIndex,
    pub records: Vec<StoryRecord>,
    pub embedder: Arc<dyn EmbeddingClient>,
    pub llm: Arc<dyn ChatClient>,
}

impl QueryContext {
    /// Load the persisted artifacts and construct the remote clients.
    pub fn load(config: Config) -> Result<Self> {
        let paths = ArtifactPaths::new(&config);

        let index = VectorIndex::load(&paths.index())
            .context("Failed to load vector index — has the pipeline run?")?;
        let records: Vec<StoryRecord> = artifacts::read_json(&paths.metadata())
            .context("Failed to load story metadata — has the pipeline run?")?;

        if index.len() != records.len() {
            warn!(
                index = index.len(),
                metadata = records.len(),
                "Index/metadata row counts differ; out-of-range rows will be skipped"
            );
        }

        let embedder = Arc::new(OpenAiEmbeddings::new(&config.embedding)?);
        ensure!(
            embedder.dims() == index.dims(),
            "Embedding backend produces {} dims but the index holds {} — \
             rebuild the index with a matching backend",
            embedder.dims(),
            index.dims()
        );
        let llm = Arc::new(OpenAiChat::new(&config.llm)?);

        info!(stories = records.len(), "Query context ready");
        Ok(Self {
            config,
            index,
            records,
            embedder,
            llm,
        })
    }

    /// Construct a context from in-memory parts. Used by tests and by
    /// callers that already hold clients.
    pub fn with_clients(
        config: Config,
        index: VectorIndex,
        records: Vec<StoryRecord>,
        embedder: Arc<dyn EmbeddingClient>,
        llm: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            config,
            index,
            records,
            embedder,
            llm,
        }
    }
}

/// Embed the query and return the top-K stories by similarity,
/// descending. Row ids outside the metadata store are skipped.
pub async fn retrieve(ctx: &QueryContext, query: &str) -> Result<Vec<RetrievedStory>> {
    let embedded = ctx.embedder.embed(&[query.to_string()]).await?;
    let query_vec = embedded
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response for query"))?;

    let hits = ctx.index.search(&query_vec, ctx.config.retrieval.top_k)?;

    let mut retrieved = Vec::with_capacity(hits.len());
    for (row, score) in hits {
        match ctx.records.get(row) {
            Some(record) => retrieved.push(RetrievedStory {
                record: record.clone(),
                relevance: score,
            }),
            None => {
                warn!(row, records = ctx.records.len(), "Row id outside metadata bounds, skipping");
            }
        }
    }

    info!(query = crate::enrich::truncate_chars(query, 80), results = retrieved.len(), "Retrieved stories");
    Ok(retrieved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::l2_normalize;
    use anyhow::bail;
    use async_trait::async_trait;

    /// Maps known phrases to fixed unit vectors.
    struct PhraseEmbedder;

    #[async_trait]
    impl EmbeddingClient for PhraseEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = if t.contains("rust") {
                        vec![1.0, 0.0, 0.0]
                    } else if t.contains("gpu") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    };
                    l2_normalize(&mut v);
                    v
                })
                .collect())
        }

        fn dims(&self) -> usize {
            3
        }
    }

    struct UnusedLlm;

    #[async_trait]
    impl ChatClient for UnusedLlm {
        async fn complete(
            &self,
            _messages: &[crate::models::ChatMessage],
            _temperature: f32,
            _max_tokens: Option<u32>,
        ) -> Result<String> {
            bail!("not used in retrieval tests");
        }
    }

    fn record(id: &str, title: &str) -> StoryRecord {
        StoryRecord {
            id: id.to_string(),
            title: title.to_string(),
            summary: String::new(),
            score: 10,
            num_comments: 0,
            hn_url: String::new(),
            url: String::new(),
            topics: vec![],
            snippet: String::new(),
        }
    }

    fn test_context(records: Vec<StoryRecord>, vectors: Vec<Vec<f32>>) -> QueryContext {
        let mut config = Config::default();
        config.embedding.dims = 3;
        config.retrieval.top_k = 2;

        let mut index = VectorIndex::new(3);
        for mut v in vectors {
            l2_normalize(&mut v);
            index.add(&v).unwrap();
        }

        QueryContext::with_clients(
            config,
            index,
            records,
            Arc::new(PhraseEmbedder),
            Arc::new(UnusedLlm),
        )
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_similarity() {
        let ctx = test_context(
            vec![record("1", "About rust"), record("2", "About gpus")],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
        );

        let results = retrieve(&ctx, "a rust story").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.id, "1");
        assert!(results[0].relevance > results[1].relevance);
    }

    #[tokio::test]
    async fn test_retrieve_skips_rows_outside_metadata() {
        // Index has two rows, metadata only one — skew
        let ctx = test_context(
            vec![record("1", "Only record")],
            vec![vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0]],
        );

        let results = retrieve(&ctx, "a rust story").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.id, "1");
    }

    #[tokio::test]
    async fn test_retrieve_deterministic() {
        let ctx = test_context(
            vec![record("1", "A"), record("2", "B"), record("3", "C")],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.5, 0.5, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        );

        let a = retrieve(&ctx, "a rust story").await.unwrap();
        let b = retrieve(&ctx, "a rust story").await.unwrap();
        let ids_a: Vec<&str> = a.iter().map(|r| r.record.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
