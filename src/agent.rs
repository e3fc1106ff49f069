//! Retrieval-conditioned answer generation.
//!
//! A strict linear flow: retrieve evidence, then make one generation
//! call conditioned on the user's query, the numbered evidence block,
//! the persona instruction, and any prior conversation turns replayed in
//! role order. Empty retrieval short-circuits with a fixed message
//! before the generator is ever invoked, and a failed generation call
//! degrades to a fixed apology — callers always get text back, never an
//! error.

use tracing::{info, warn};

use crate::models::{ChatMessage, RetrievedStory};
use crate::retrieve::{self, QueryContext};

/// Returned when retrieval finds nothing relevant.
pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant stories for that query. \
     Try rephrasing or asking about a different topic.";

/// Returned when retrieval or generation fails.
pub const UNAVAILABLE_MESSAGE: &str = "I wasn't able to put together an answer just now. \
     Make sure the pipeline has run today, then try again.";

const RESPONDER_SYSTEM_PROMPT: &str = "You are 'The Daily', a friendly and knowledgeable tech \
     news assistant. Given Hacker News stories and their summaries, provide a clear, \
     conversational answer to the user's question. Highlight key trends and insights. Use \
     markdown formatting. End with a brief 'Sources' section listing the relevant HN stories. \
     Use the conversation history to understand follow-up questions.";

const MAX_SOURCES: usize = 5;
const SOURCE_TITLE_CHARS: usize = 60;

/// Answer a query over today's corpus, optionally conditioned on prior
/// turns. The history is never mutated; the caller owns it.
pub async fn answer(ctx: &QueryContext, query: &str, history: &[ChatMessage]) -> String {
    let retrieved = match retrieve::retrieve(ctx, query).await {
        Ok(retrieved) => retrieved,
        Err(e) => {
            warn!(error = %e, "Retrieval failed");
            return UNAVAILABLE_MESSAGE.to_string();
        }
    };

    if retrieved.is_empty() {
        info!("No stories retrieved, short-circuiting");
        return NO_RESULTS_MESSAGE.to_string();
    }

    let messages = build_prompt(query, &retrieved, history);

    match ctx
        .llm
        .complete(&messages, ctx.config.llm.answer_temperature, None)
        .await
    {
        Ok(response) => {
            info!(chars = response.len(), "Generated response");
            response
        }
        Err(e) => {
            warn!(error = %e, "Generation failed");
            UNAVAILABLE_MESSAGE.to_string()
        }
    }
}

/// Assemble the full message sequence for the generation call:
/// persona, prior turns in role order, then the current turn carrying
/// the query, the numbered evidence, and the sources list.
pub(crate) fn build_prompt(
    query: &str,
    retrieved: &[RetrievedStory],
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(RESPONDER_SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());

    let current = format!(
        "{}\n\n--- Relevant stories from today ---\n{}\n\n--- Sources ---\n{}",
        query,
        evidence_block(retrieved),
        sources_list(retrieved)
    );
    messages.push(ChatMessage::user(current));
    messages
}

/// Number the retrieved stories so the generator can cite them by
/// ordinal.
fn evidence_block(retrieved: &[RetrievedStory]) -> String {
    retrieved
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{}] (score: {}, comments: {}, topics: {})\nTitle: {}\nSummary: {}",
                i + 1,
                r.record.score,
                r.record.num_comments,
                r.record.topics.join(", "),
                r.record.title,
                r.record.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown link list for the top retrieved stories with engagement
/// stats.
fn sources_list(retrieved: &[RetrievedStory]) -> String {
    retrieved
        .iter()
        .take(MAX_SOURCES)
        .map(|r| {
            format!(
                "- [{}]({}) ({} pts, {} comments)",
                crate::enrich::truncate_chars(&r.record.title, SOURCE_TITLE_CHARS),
                r.record.hn_url,
                r.record.score,
                r.record.num_comments
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
