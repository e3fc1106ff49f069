//! On-disk artifact layout and atomic whole-file replacement.
//!
//! Every persisted artifact (raw snapshot, vector index, metadata store,
//! charts dataset, daily digest) is overwritten wholesale per batch cycle.
//! Writes go to a temp sibling first and are renamed into place, so a
//! reader never observes a partially written file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Resolved locations of all persisted artifacts under the data dir.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(config: &Config) -> Self {
        let base = config.data.dir.clone();
        Self {
            raw_dir: base.join("raw"),
            processed_dir: base.join("processed"),
        }
    }

    /// Create the raw and processed directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.raw_dir)
            .with_context(|| format!("Failed to create {}", self.raw_dir.display()))?;
        std::fs::create_dir_all(&self.processed_dir)
            .with_context(|| format!("Failed to create {}", self.processed_dir.display()))?;
        Ok(())
    }

    /// One raw snapshot file per calendar date.
    pub fn raw_snapshot(&self, date: NaiveDate) -> PathBuf {
        self.raw_dir.join(format!("{}_hn.json", date.format("%Y-%m-%d")))
    }

    pub fn index(&self) -> PathBuf {
        self.processed_dir.join("index.vec")
    }

    pub fn metadata(&self) -> PathBuf {
        self.processed_dir.join("stories.json")
    }

    pub fn charts(&self) -> PathBuf {
        self.processed_dir.join("charts_data.json")
    }

    pub fn digest(&self) -> PathBuf {
        self.processed_dir.join("daily_digest.json")
    }
}

/// Write raw bytes to `path` via a temp sibling + rename.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_sibling(path);
    std::fs::write(&tmp, bytes)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &bytes)
}

/// Load a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("value.json");

        write_json_atomic(&path, &vec![1i64, 2, 3]).unwrap();
        let restored: Vec<i64> = read_json(&path).unwrap();
        assert_eq!(restored, vec![1, 2, 3]);
    }

    #[test]
    fn test_atomic_write_replaces_whole_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("value.json");

        write_json_atomic(&path, &"a long first value with plenty of bytes").unwrap();
        write_json_atomic(&path, &"short").unwrap();

        let restored: String = read_json(&path).unwrap();
        assert_eq!(restored, "short");
        // No temp sibling left behind
        assert!(!path.with_file_name("value.json.tmp").exists());
    }

    #[test]
    fn test_raw_snapshot_path_is_dated() {
        let mut config = Config::default();
        config.data.dir = PathBuf::from("/tmp/radar-data");
        let paths = ArtifactPaths::new(&config);
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert!(paths
            .raw_snapshot(date)
            .ends_with("raw/2025-07-04_hn.json"));
    }
}
