//! CLI output formatting utilities.

use crate::session::IndexSummary;
use crate::vector_store::SearchResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print what an index build produced.
    pub fn index_summary(summary: &IndexSummary) {
        Output::success(&format!(
            "Indexed {} ({} pages, {} chunks)",
            style(&summary.source).bold(),
            summary.pages,
            summary.chunks
        ));
    }

    /// Print search result.
    pub fn search_result(rank: usize, result: &SearchResult, preview_chars: usize) {
        println!(
            "\n{} {} page {} (score: {:.2})",
            style(">>").green(),
            style(format!("#{}", rank)).bold(),
            style(result.chunk.page_label()).cyan(),
            result.score
        );
        println!("   {}", result.chunk.preview(preview_chars));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
