use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub hn: HnConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct HnConfig {
    #[serde(default = "default_hn_base")]
    pub base_url: String,
    #[serde(default = "default_front_page_hits")]
    pub front_page_hits: usize,
    #[serde(default = "default_search_hits")]
    pub search_hits_per_query: usize,
    #[serde(default = "default_top_comments")]
    pub top_comments: usize,
    #[serde(default = "default_min_score")]
    pub min_score: i64,
    #[serde(default = "default_topic_queries")]
    pub topic_queries: Vec<String>,
    #[serde(default = "default_hn_timeout")]
    pub timeout_secs: u64,
}

impl Default for HnConfig {
    fn default() -> Self {
        Self {
            base_url: default_hn_base(),
            front_page_hits: default_front_page_hits(),
            search_hits_per_query: default_search_hits(),
            top_comments: default_top_comments(),
            min_score: default_min_score(),
            topic_queries: default_topic_queries(),
            timeout_secs: default_hn_timeout(),
        }
    }
}

fn default_hn_base() -> String {
    "https://hn.algolia.com/api/v1".to_string()
}
fn default_front_page_hits() -> usize {
    200
}
fn default_search_hits() -> usize {
    50
}
fn default_top_comments() -> usize {
    5
}
fn default_min_score() -> i64 {
    10
}
fn default_hn_timeout() -> u64 {
    30
}

fn default_topic_queries() -> Vec<String> {
    [
        "machine learning",
        "artificial intelligence",
        "programming language",
        "open source",
        "startup",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            api_base: default_api_base(),
            summary_max_tokens: default_summary_max_tokens(),
            summary_temperature: default_summary_temperature(),
            answer_temperature: default_answer_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_summary_max_tokens() -> u32 {
    150
}
fn default_summary_temperature() -> f32 {
    0.3
}
fn default_answer_temperature() -> f32 {
    0.5
}
fn default_llm_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            api_base: default_api_base(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    100
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct InsightsConfig {
    #[serde(default = "default_breakthrough_score")]
    pub breakthrough_score: i64,
    #[serde(default = "default_hot_comment_floor")]
    pub hot_comment_floor: i64,
    #[serde(default = "default_top_limit")]
    pub top_stories_limit: usize,
    #[serde(default = "default_top_limit")]
    pub hot_limit: usize,
    #[serde(default = "default_top_limit")]
    pub domain_limit: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            breakthrough_score: default_breakthrough_score(),
            hot_comment_floor: default_hot_comment_floor(),
            top_stories_limit: default_top_limit(),
            hot_limit: default_top_limit(),
            domain_limit: default_top_limit(),
        }
    }
}

fn default_breakthrough_score() -> i64 {
    300
}
fn default_hot_comment_floor() -> i64 {
    20
}
fn default_top_limit() -> usize {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.hn.front_page_hits == 0 {
        anyhow::bail!("hn.front_page_hits must be > 0");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    if config.enrich.workers == 0 {
        anyhow::bail!("enrich.workers must be >= 1");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.llm.summary_temperature)
        || !(0.0..=2.0).contains(&config.llm.answer_temperature)
    {
        anyhow::bail!("llm temperatures must be in [0.0, 2.0]");
    }

    Ok(())
}
