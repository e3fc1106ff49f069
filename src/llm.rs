//! Chat-completion backend abstraction and the OpenAI-compatible
//! implementation.
//!
//! Callers hand over a role-tagged message sequence and get generated
//! text back. There is no retry here: summarization failures degrade
//! per item and query-time failures degrade to a fixed user-visible
//! message, so a failed call is simply reported to the caller.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::models::ChatMessage;

/// A text-generation backend accepting role-tagged messages.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String>;
}

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
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
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
        });
        if let Some(cap) = max_tokens {
            body["max_tokens"] = serde_json::json!(cap);
        }

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Chat API error {}: {}", status, body_text);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Invalid chat completion response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat completion response had no content"))?;

        Ok(content.trim().to_string())
    }
}
