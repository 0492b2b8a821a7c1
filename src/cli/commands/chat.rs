//! Interactive chat command.

use super::apply_overrides;
use crate::cli::preflight::{self, Operation};
use crate::cli::repl::{run_loop, ReplOptions};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use crate::session::Terminator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shown when a document could not be found or read.
pub(crate) const SUPPORTED_FORMATS_HINT: &str =
    "Supported documents: .txt, .md, .json (pages) and .pdf with a text layer.";

/// Records whether Ctrl-C ended the session, as opposed to the exit keyword or EOF.
#[derive(Debug, Clone, Default)]
struct Interrupt {
    fired: Arc<AtomicBool>,
}

impl Interrupt {
    fn fire(&self, terminator: &Terminator) {
        self.fired.store(true, Ordering::SeqCst);
        terminator.terminate();
    }

    fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(
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

    let settings = apply_overrides(settings, model, top_k);
    let path = settings.document_path(document.as_deref())?;
    let orchestrator = Orchestrator::new(settings.clone())?;

    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let opened = orchestrator.open_session(&path).await;
    spinner.finish_and_clear();

    let (mut session, summary) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            Output::error(&format!("Failed to index document: {}", e));
            if e.is_document_error() {
                Output::info(SUPPORTED_FORMATS_HINT);
            }
            return Err(e.into());
        }
    };
    Output::index_summary(&summary);

    println!("\n{}", style("Pagewise Chat").bold().cyan());
    println!(
        "{}",
        style(format!(
            "Type your questions, or '{}' to quit.",
            settings.session.exit_keyword
        ))
        .dim()
    );

    let terminator = session.terminator();
    let interrupt = Interrupt::default();
    let ctrl_c = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.fire(&terminator);
            }
        })
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let options = ReplOptions::from_settings(&settings.session);
    let stats = run_loop(&mut session, stdin, &mut stdout, &options).await;
    ctrl_c.abort();
    let stats = stats?;

    info!(
        "Session ended: {} answered, {} failed, {} blank",
        stats.answered, stats.failed, stats.rejected
    );
    Output::info(&format!(
        "Answered {} questions ({} failed)",
        stats.answered, stats.failed
    ));

    if interrupt.fired() {
        // The stdin reader thread is still blocked on a read.
        std::process::exit(0);
    }

    Ok(())
}
