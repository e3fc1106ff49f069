//! # news-radar CLI (`radar`)
//!
//! The `radar` binary drives both halves of the system: the daily batch
//! pipeline and the query path over its artifacts.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `radar pipeline` | Run the full batch cycle: collect, clean, enrich, index, insights |
//! | `radar search "<query>"` | Semantic search over today's corpus (no generation) |
//! | `radar ask "<query>"` | Ask a one-shot question and get a cited answer |
//! | `radar chat` | Interactive session with conversation memory |
//! | `radar digest` | Print the persisted daily digest |
//!
//! ## Examples
//!
//! ```bash
//! # Build today's corpus
//! radar pipeline --config ./config/radar.toml
//!
//! # What made the front page about Rust?
//! radar ask "anything interesting about rust today?"
//!
//! # Follow-up questions with memory
//! radar chat
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use news_radar::models::ChatMessage;
use news_radar::{agent, artifacts, config, insights, pipeline, retrieve};

/// news-radar — a daily Hacker News ingestion, insight, and
/// retrieval-augmented briefing engine.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; every setting has a default, so a missing file
/// only matters if you need non-default paths or models.
#[derive(Parser)]
#[command(
    name = "radar",
    about = "news-radar — daily Hacker News ingestion and retrieval-augmented briefings",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/radar.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the daily batch cycle.
    ///
    /// Collects front-page and topic-search stories, cleans them,
    /// enriches them with summaries/topics/embeddings, rebuilds the
    /// vector index and metadata store, and writes the daily digest and
    /// charts dataset. Requires `OPENAI_API_KEY`.
    Pipeline {
        /// Skip per-story comment fetching (faster, less context).
        #[arg(long)]
        skip_comments: bool,
    },

    /// Search today's corpus by semantic similarity.
    ///
    /// Embeds the query and prints the top matches with similarity
    /// scores. No answer generation.
    Search {
        /// The search query string.
        query: String,
    },

    /// Ask a one-shot question about today's tech news.
    Ask {
        /// The question to answer.
        query: String,
    },

    /// Interactive chat with conversation memory.
    ///
    /// Reads questions from stdin until EOF or `exit`. Prior turns are
    /// replayed into each generation call so follow-ups work.
    Chat,

    /// Print the persisted daily digest.
    Digest,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_radar=info")),
        )
        .init();

    let cli = Cli::parse();

    // A missing config file falls back to defaults; a present but
    // invalid one is an error.
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::default()
    };

    match cli.command {
        Commands::Pipeline { skip_comments } => {
            pipeline::run_pipeline(&cfg, !skip_comments).await?;
            println!("Pipeline completed.");
        }
        Commands::Search { query } => {
            let ctx = retrieve::QueryContext::load(cfg)?;
            let results = retrieve::retrieve(&ctx, &query).await?;

            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }

            for (i, result) in results.iter().enumerate() {
                println!(
                    "{:>2}. [{:.3}] {} ({} pts, {} comments)",
                    i + 1,
                    result.relevance,
                    result.record.title,
                    result.record.score,
                    result.record.num_comments
                );
                println!("    {}", result.record.hn_url);
            }
        }
        Commands::Ask { query } => {
            let ctx = retrieve::QueryContext::load(cfg)?;
            let response = agent::answer(&ctx, &query, &[]).await;
            println!("{}", response);
        }
        Commands::Chat => {
            let ctx = retrieve::QueryContext::load(cfg)?;
            run_chat(&ctx).await?;
        }
        Commands::Digest => {
            let paths = artifacts::ArtifactPaths::new(&cfg);
            let digest: insights::DailyDigest = artifacts::read_json(&paths.digest())?;
            print_digest(&digest);
        }
    }

    Ok(())
}

/// Read-eval loop over stdin. The conversation history lives here, in
/// the caller — the agent only ever borrows it.
async fn run_chat(ctx: &retrieve::QueryContext) -> Result<()> {
    let stdin = std::io::stdin();
    let mut history: Vec<ChatMessage> = Vec::new();

    println!("Ask about today's tech news (exit to quit).");
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" || query == "quit" {
            break;
        }

        let response = agent::answer(ctx, query, &history).await;
        println!("\n{}\n", response);

        history.push(ChatMessage::user(query));
        history.push(ChatMessage::assistant(&response));
    }

    Ok(())
}

fn print_digest(digest: &insights::DailyDigest) {
    println!(
        "Daily digest — {} ({} stories)",
        digest.date, digest.total_stories
    );

    if !digest.breakthroughs.is_empty() {
        println!("\nBreakthroughs:");
        for bt in &digest.breakthroughs {
            println!("  {} ({} pts, {} comments)", bt.title, bt.score, bt.num_comments);
        }
    }

    println!("\nTop stories:");
    for (i, story) in digest.top_stories.iter().enumerate() {
        println!("  {:>2}. {} ({} pts)", i + 1, story.title, story.score);
    }

    println!("\nTrending topics:");
    for trend in &digest.trending_topics {
        println!(
            "  {:<24} {} stories, avg {} pts",
            trend.topic, trend.count, trend.avg_score
        );
    }
}
