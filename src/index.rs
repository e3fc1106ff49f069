//! Flat inner-product vector index and the index/metadata pair builder.
//!
//! The index is a dense row-major f32 matrix. `add` appends a vector and
//! returns its row id; row ids are the sole join key into the metadata
//! store, so rows must be added in exactly the order the metadata records
//! are written. Vectors are expected to be L2-normalized, making inner
//! product equal to cosine similarity.
//!
//! On-disk format (all integers little-endian):
//!
//! ```text
//! magic  "NRVI"      4 bytes
//! version u32        currently 1
//! dims    u32
//! count   u32
//! digest  [u8; 32]   SHA-256 of the vector payload
//! data    count × dims × f32
//! ```
//!
//! The digest is verified on load; a mismatch means a torn or corrupted
//! file and fails loudly rather than serving wrong neighbors.

use anyhow::{bail, ensure, Context, Result};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

use crate::artifacts::{self, ArtifactPaths};
use crate::config::Config;
use crate::enrich::truncate_chars;
use crate::models::{Enrichment, Story, StoryRecord};

const MAGIC: &[u8; 4] = b"NRVI";
const VERSION: u32 = 1;
const SNIPPET_CHARS: usize = 300;

/// Dense vector index supporting append-order adds and top-K search.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dims: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector, returning its row id (the append position).
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        ensure!(
            vector.len() == self.dims,
            "Vector has {} dims, index expects {}",
            vector.len(),
            self.dims
        );
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    /// Top-K search by inner product, descending. Ties break by ascending
    /// row id so results are fully deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        ensure!(
            query.len() == self.dims,
            "Query has {} dims, index expects {}",
            query.len(),
            self.dims
        );

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(row, vec)| {
                let dot: f32 = vec.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (row, dot)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Serialize and atomically replace the index file at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload: Vec<u8> = self.data.iter().flat_map(|v| v.to_le_bytes()).collect();
        let digest = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(48 + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);

        artifacts::write_bytes_atomic(path, &bytes)
            .with_context(|| format!("Failed to write index {}", path.display()))
    }

    /// Load and verify an index file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        ensure!(bytes.len() >= 48, "Index file too short");
        ensure!(&bytes[0..4] == MAGIC, "Not an index file (bad magic)");

        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        ensure!(version == VERSION, "Unsupported index version {}", version);

        let dims = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let count = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
        let stored_digest = &bytes[16..48];
        let payload = &bytes[48..];

        ensure!(
            payload.len() == count * dims * 4,
            "Index payload size mismatch: header says {} vectors of {} dims, payload is {} bytes",
            count,
            dims,
            payload.len()
        );

        let digest = Sha256::digest(payload);
        if digest.as_slice() != stored_digest {
            bail!("Index digest mismatch — file is corrupt or torn");
        }

        let data: Vec<f32> = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dims, data })
    }
}

/// Build the index/metadata pair from enriched stories and replace both
/// artifacts atomically.
///
/// Fails fast (and leaves the previous pair untouched) when the
/// embedding count or dimensionality does not match — that is a
/// programmer or data error, not a transient fault.
pub fn build_index(
    stories: &[Story],
    enrichment: &Enrichment,
    config: &Config,
    paths: &ArtifactPaths,
) -> Result<()> {
    ensure!(
        enrichment.embeddings.len() == stories.len(),
        "Embedding count {} does not match story count {}",
        enrichment.embeddings.len(),
        stories.len()
    );

    let dims = config.embedding.dims;
    let mut index = VectorIndex::new(dims);
    for (i, vector) in enrichment.embeddings.iter().enumerate() {
        ensure!(
            vector.len() == dims,
            "Embedding {} has {} dims, expected {}",
            i,
            vector.len(),
            dims
        );
        let row = index.add(vector)?;
        debug_assert_eq!(row, i);
    }

    let records: Vec<StoryRecord> = stories
        .iter()
        .enumerate()
        .map(|(i, story)| StoryRecord {
            id: story.id.clone(),
            title: story.title.clone(),
            summary: enrichment.summaries.get(i).cloned().unwrap_or_default(),
            score: story.score,
            num_comments: story.num_comments,
            hn_url: story.hn_url.clone(),
            url: story.url.clone(),
            topics: enrichment.topics.get(i).cloned().unwrap_or_default(),
            snippet: truncate_chars(&story.text, SNIPPET_CHARS).to_string(),
        })
        .collect();

    // Replace the pair: index first, then metadata. Each rename is
    // atomic; QueryContext::load cross-checks the counts on read.
    index.save(&paths.index())?;
    artifacts::write_json_atomic(&paths.metadata(), &records)?;

    info!(
        vectors = index.len(),
        path = %paths.index().display(),
        "Index and metadata saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::l2_normalize;
    use tempfile::TempDir;

    fn unit(values: &[f32]) -> Vec<f32> {
        let mut v = values.to_vec();
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn test_add_returns_append_order_rows() {
        let mut index = VectorIndex::new(3);
        assert_eq!(index.add(&[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add(&[0.0, 1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.add(&[0.0, 0.0, 1.0]).unwrap(), 2);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_add_rejects_wrong_dims() {
        let mut index = VectorIndex::new(3);
        assert!(index.add(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let mut index = VectorIndex::new(2);
        index.add(&unit(&[1.0, 0.0])).unwrap();
        index.add(&unit(&[0.0, 1.0])).unwrap();
        index.add(&unit(&[1.0, 1.0])).unwrap();

        let results = index.search(&unit(&[1.0, 0.1]), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 2);
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_search_deterministic() {
        let mut index = VectorIndex::new(4);
        for i in 0..50 {
            let mut v = vec![(i % 7) as f32, (i % 3) as f32, 1.0, (i % 5) as f32];
            l2_normalize(&mut v);
            index.add(&v).unwrap();
        }
        let query = unit(&[0.3, 0.5, 0.7, 0.1]);

        let a = index.search(&query, 10).unwrap();
        let b = index.search(&query, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_search_ties_break_by_row_id() {
        let mut index = VectorIndex::new(2);
        // Identical vectors — identical scores
        index.add(&unit(&[1.0, 0.0])).unwrap();
        index.add(&unit(&[1.0, 0.0])).unwrap();
        index.add(&unit(&[1.0, 0.0])).unwrap();

        let results = index.search(&unit(&[1.0, 0.0]), 3).unwrap();
        let rows: Vec<usize> = results.iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.vec");

        let mut index = VectorIndex::new(3);
        index.add(&unit(&[1.0, 2.0, 3.0])).unwrap();
        index.add(&unit(&[4.0, 5.0, 6.0])).unwrap();
        index.save(&path).unwrap();

        let restored = VectorIndex::load(&path).unwrap();
        assert_eq!(restored.dims(), 3);
        assert_eq!(restored.len(), 2);

        let query = unit(&[1.0, 2.0, 3.0]);
        assert_eq!(
            index.search(&query, 2).unwrap(),
            restored.search(&query, 2).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_corrupt_payload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.vec");

        let mut index = VectorIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        index.save(&path).unwrap();

        // Flip a payload byte
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        assert!(VectorIndex::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.vec");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        assert!(VectorIndex::load(&path).is_err());
    }
}
