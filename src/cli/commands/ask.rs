//! Ask command implementation.

use super::apply_overrides;
use super::chat::SUPPORTED_FORMATS_HINT;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::QueryOutcome;
use anyhow::{bail, Result};

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    document: Option<String>,
    model: Option<String>,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if question.trim().is_empty() {
        bail!("Question must not be empty");
    }

    let settings = apply_overrides(settings, model, top_k);
    let path = settings.document_path(document.as_deref())?;
    let orchestrator = Orchestrator::new(settings.clone())?;

    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let opened = orchestrator.open_session(&path).await;
    spinner.finish_and_clear();
    let (mut session, summary) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            if e.is_document_error() {
                Output::info(SUPPORTED_FORMATS_HINT);
            }
            return Err(e.into());
        }
    };
    Output::index_summary(&summary);

    let spinner = Output::spinner("Generating answer...");
    let outcome = session.ask(question).await;
    spinner.finish_and_clear();

    match outcome {
        QueryOutcome::Answered(answer) => {
            println!("\n{}\n", answer.text);

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::search_result(i + 1, source, settings.session.preview_chars);
                }
            }
        }
        QueryOutcome::Failed { message, .. } => {
            Output::error(&format!("Failed to generate answer: {}", message));
            bail!(message);
        }
        QueryOutcome::Rejected => bail!("Question must not be empty"),
        QueryOutcome::NotReady | QueryOutcome::Terminated => {
            bail!("Session is not accepting questions")
        }
    }

    Ok(())
}
