//! Embedding backend abstraction and the OpenAI-compatible implementation.
//!
//! The same backend must be used at index-build time and at query time —
//! mixing embedding spaces silently degrades retrieval relevance. All
//! vectors leaving this module are L2-normalized so that inner-product
//! similarity in the index equals cosine similarity.
//!
//! Retry strategy for the remote backend:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry with backoff
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;

/// A backend that turns a batch of texts into fixed-dimension vectors,
/// one per input, in input order.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts. Output vectors are L2-normalized.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimensionality this backend produces. Checked against the
    /// configured dimension before a batch is embedded and against the
    /// persisted index when a query context loads.
    fn dims(&self) -> usize;
}

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint.
///
/// Splits large inputs into sub-batches of `batch_size` texts; each
/// sub-batch is retried independently so one transient failure does not
/// restart the whole run.
pub struct OpenAiEmbeddings {
    http: reqwest::Client,
    config: EmbeddingConfig,
    api_key: String,
}

impl OpenAiEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            config: config.clone(),
            api_key,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/embeddings",
            self.config.api_base.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_embeddings_response(&json, texts.len());
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Embedding API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Embedding API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.batch_size) {
            let mut vectors = self.embed_batch(batch).await?;
            for vec in &mut vectors {
                l2_normalize(vec);
            }
            all.extend(vectors);
            debug!(embedded = all.len(), total = texts.len(), "Embedded texts");
        }

        Ok(all)
    }

    fn dims(&self) -> usize {
        self.config.dims
    }
}

/// Parse an OpenAI-style embeddings response.
///
/// Rows are placed by their `index` field, so response order never has
/// to match input order.
fn parse_embeddings_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data array"))?;

    if data.len() != expected {
        bail!(
            "Invalid embeddings response: expected {} rows, got {}",
            expected,
            data.len()
        );
    }

    let mut rows: Vec<Vec<f32>> = vec![Vec::new(); expected];

    for (pos, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        if index >= expected {
            bail!("Invalid embeddings response: index {} out of range", index);
        }

        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing embedding"))?;

        rows[index] = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
    }

    Ok(rows)
}

/// Scale a vector to unit length. Zero vectors are left untouched.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0f32, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_response_orders_by_index() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]},
            ]
        });
        let rows = parse_embeddings_response(&json, 2).unwrap();
        assert_eq!(rows[0], vec![1.0, 0.0]);
        assert_eq!(rows[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_response_rejects_short_batch() {
        let json = serde_json::json!({
            "data": [{"index": 0, "embedding": [1.0]}]
        });
        assert!(parse_embeddings_response(&json, 2).is_err());
    }
}
