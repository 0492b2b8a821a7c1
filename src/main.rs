//! Pagewise CLI entry point.

use anyhow::Result;
use clap::Parser;
use pagewise::cli::{commands, Cli, Commands};
use pagewise::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads OPENAI_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pagewise={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Execute command
    match cli.command {
        Commands::Chat {
            document,
            model,
            top_k,
        } => {
            commands::run_chat(document, model, top_k, settings).await?;
        }

        Commands::Ask {
            question,
            document,
            model,
            top_k,
        } => {
            commands::run_ask(&question, document, model, top_k, settings).await?;
        }

        Commands::Search {
            query,
            document,
            limit,
            min_score,
        } => {
            commands::run_search(&query, document, limit, min_score, settings).await?;
        }

        Commands::Chunks {
            document,
            max_chunk_size,
            overlap,
        } => {
            commands::run_chunks(document, max_chunk_size, overlap, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path.as_ref())?;
        }
    }

    Ok(())
}
