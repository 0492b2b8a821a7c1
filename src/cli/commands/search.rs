//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Retriever;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    document: Option<String>,
    limit: usize,
    min_score: Option<f32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = settings.document_path(document.as_deref())?;
    let preview_chars = settings.session.preview_chars;
    let min_score = min_score.or(settings.retrieval.min_score);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let opened = orchestrator.open_session(&path).await;
    spinner.finish_and_clear();
    let (session, summary) = opened?;
    Output::index_summary(&summary);

    let index = session
        .index()
        .cloned()
        .ok_or_else(|| anyhow!("Document was not indexed"))?;
    let retriever = Retriever::new(orchestrator.embedder(), Arc::clone(&index))
        .with_top_k(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = retriever.retrieve(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for (i, result) in results.iter().enumerate() {
                    Output::search_result(i + 1, result, preview_chars);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
