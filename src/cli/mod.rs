//! CLI module for Pagewise.

pub mod commands;
mod output;
pub mod preflight;
pub mod repl;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pagewise - question answering over a single document
///
/// Splits a document into overlapping chunks, indexes their embeddings in
/// memory and answers questions with the passages they were based on.
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive question answering session over a document
    Chat {
        /// Document to load (.txt, .md or .json)
        #[arg(short, long, env = "PAGEWISE_DOCUMENT")]
        document: Option<String>,

        /// LLM model to use for answers
        #[arg(short, long)]
        model: Option<String>,

        /// Number of chunks retrieved per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Ask a single question about a document
    Ask {
        /// The question to ask
        question: String,

        /// Document to load (.txt, .md or .json)
        #[arg(short, long, env = "PAGEWISE_DOCUMENT")]
        document: Option<String>,

        /// LLM model to use for the answer
        #[arg(short, long)]
        model: Option<String>,

        /// Number of chunks retrieved for the question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Search a document for the passages closest to a query
    Search {
        /// Search query
        query: String,

        /// Document to load (.txt, .md or .json)
        #[arg(short, long, env = "PAGEWISE_DOCUMENT")]
        document: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(long)]
        min_score: Option<f32>,
    },

    /// Show how a document is split into chunks (no API calls)
    Chunks {
        /// Document to load (.txt, .md or .json)
        #[arg(short, long, env = "PAGEWISE_DOCUMENT")]
        document: Option<String>,

        /// Maximum characters per chunk
        #[arg(long)]
        max_chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
