//! Pagewise - question answering over a single document
//!
//! A CLI tool and library that answers questions about one document using
//! retrieval-augmented generation.
//!
//! # Overview
//!
//! Pagewise:
//! - Splits a document's pages into overlapping chunks that never cross a page
//! - Embeds the chunks and keeps them in an in-memory index
//! - Retrieves the chunks closest to each question
//! - Generates an answer from them and shows the sources it used
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `document` - Document loading (text, markdown, JSON pages)
//! - `chunking` - Page-aware text chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory vector index
//! - `rag` - Retrieval and answer generation
//! - `session` - Question answering session lifecycle
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use pagewise::config::Settings;
//! use pagewise::orchestrator::Orchestrator;
//! use pagewise::session::QueryOutcome;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let (mut session, summary) = orchestrator.open_session(Path::new("report.txt")).await?;
//!     println!("Indexed {} chunks", summary.chunks);
//!
//!     if let QueryOutcome::Answered(answer) = session.ask("What are the key findings?").await {
//!         println!("{}", answer.format_for_display(150));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod vector_store;

pub use error::{PagewiseError, Result};
