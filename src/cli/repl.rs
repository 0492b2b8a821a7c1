//! Line-oriented question loop used by the `chat` command.

use crate::config::SessionSettings;
use crate::error::Result;
use crate::session::{QaSession, QueryOutcome, SessionState, SessionStats};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

/// How the loop reads and prints.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    /// Input that ends the loop, compared case-insensitively after trimming.
    pub exit_keyword: String,
    /// Characters of each source shown under an answer.
    pub preview_chars: usize,
    pub prompt: String,
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self::from_settings(&SessionSettings::default())
    }
}

impl ReplOptions {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            exit_keyword: settings.exit_keyword.clone(),
            preview_chars: settings.preview_chars,
            prompt: "[Question] ".to_string(),
        }
    }
}

/// Read questions from `input` until the exit keyword, end of input or a
/// termination request, printing each outcome to `output`.
///
/// A failed question prints `Error: <message>` and the loop keeps going.
pub async fn run_loop<R, W>(
    session: &mut QaSession,
    input: R,
    output: &mut W,
    options: &ReplOptions,
) -> Result<SessionStats>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let terminator = session.terminator();
    let mut lines = input.lines();

    while session.state() != SessionState::Terminated {
        write!(output, "\n{}", options.prompt)?;
        output.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = terminator.requested() => {
                writeln!(output)?;
                session.terminate();
                break;
            }
        };

        let Some(line) = line else {
            // End of input
            writeln!(output)?;
            session.terminate();
            break;
        };

        let question = line.trim();
        if question.eq_ignore_ascii_case(options.exit_keyword.trim()) {
            writeln!(output, "Goodbye!")?;
            session.terminate();
            break;
        }

        match session.ask(question).await {
            QueryOutcome::Answered(answer) => {
                writeln!(output, "\n{}", answer.format_for_display(options.preview_chars))?;
            }
            QueryOutcome::Failed { message, .. } => {
                writeln!(output, "Error: {}", message)?;
            }
            QueryOutcome::Rejected => {
                debug!("Ignoring blank question");
            }
            QueryOutcome::NotReady => {
                writeln!(output, "Error: no document has been indexed")?;
                break;
            }
            QueryOutcome::Terminated => break,
        }
    }

    Ok(session.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::document::Document;
    use crate::embedding::Embedder;
    use crate::error::PagewiseError;
    use crate::rag::Generator;
    use crate::session::SessionConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(["a", "e", "o"]
                .iter()
                .map(|l| lower.matches(l).count() as f32 + 0.5)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, question: &str, _supporting: &[Arc<Chunk>]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if question.contains("boom") {
                return Err(PagewiseError::Generation("upstream unavailable".to_string()));
            }
            Ok(format!("Answer to: {}", question))
        }
    }

    async fn ready_session(generator: Arc<CountingGenerator>) -> QaSession {
        let mut session = QaSession::new(
            SessionConfig {
                top_k: 2,
                ..SessionConfig::default()
            },
            Arc::new(LetterEmbedder),
            generator,
        );
        let document = Document::from_page_texts(
            "animals.txt",
            ["Otters float on their backs.", "Eagles nest on cliffs."],
        );
        session.load(&document).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_loop_survives_failures_until_exit() {
        let generator = Arc::new(CountingGenerator::default());
        let mut session = ready_session(generator.clone()).await;
        let input: &[u8] = b"\n   \nwhat goes boom?\nWhere do eagles nest?\n  Exit \nnever asked\n";
        let mut output = Vec::new();

        let stats = run_loop(&mut session, input, &mut output, &ReplOptions::default())
            .await
            .unwrap();
        let printed = String::from_utf8(output).unwrap();

        assert_eq!(stats.answered, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.state(), SessionState::Terminated);

        assert!(printed.contains("Error: Answer generation failed: upstream unavailable"));
        assert!(printed.contains("Answer to: Where do eagles nest?\n\nSources:\n--- (Source 1) ---"));
        assert!(printed.contains("--- (Source 2) ---"));
        assert!(printed.contains("Goodbye!"));
        assert!(!printed.contains("never asked"));
    }

    #[tokio::test]
    async fn test_end_of_input_terminates() {
        let generator = Arc::new(CountingGenerator::default());
        let mut session = ready_session(generator).await;
        let input: &[u8] = b"Do otters float?";
        let mut output = Vec::new();

        let stats = run_loop(&mut session, input, &mut output, &ReplOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.answered, 1);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_custom_exit_keyword() {
        let generator = Arc::new(CountingGenerator::default());
        let mut session = ready_session(generator.clone()).await;
        let input: &[u8] = b"exit\nQUIT\nafter quit\n";
        let mut output = Vec::new();
        let options = ReplOptions {
            exit_keyword: "quit".to_string(),
            ..ReplOptions::default()
        };

        let stats = run_loop(&mut session, input, &mut output, &options)
            .await
            .unwrap();

        // "exit" is an ordinary question here.
        assert_eq!(stats.answered, 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_requested_termination_stops_loop() {
        let generator = Arc::new(CountingGenerator::default());
        let mut session = ready_session(generator.clone()).await;
        session.terminator().terminate();
        let input: &[u8] = b"Do otters float?\n";
        let mut output = Vec::new();

        let stats = run_loop(&mut session, input, &mut output, &ReplOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.answered, 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        async fn generate(&self, question: &str, _supporting: &[Arc<Chunk>]) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            Ok(format!("Late answer to: {}", question))
        }
    }

    #[tokio::test]
    async fn test_interrupt_during_question_still_prints_answer() {
        let mut session = QaSession::new(
            SessionConfig::default(),
            Arc::new(LetterEmbedder),
            Arc::new(SlowGenerator),
        );
        let document = Document::from_page_texts("animals.txt", ["Otters float on their backs."]);
        session.load(&document).await.unwrap();

        let terminator = session.terminator();
        let interrupt = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            terminator.terminate();
        });

        let input: &[u8] = b"Do otters float?\nnever asked\n";
        let mut output = Vec::new();
        let stats = run_loop(&mut session, input, &mut output, &ReplOptions::default())
            .await
            .unwrap();
        interrupt.await.unwrap();
        let printed = String::from_utf8(output).unwrap();

        assert_eq!(stats.answered, 1);
        assert!(printed.contains("Late answer to: Do otters float?\n\nSources:"));
        assert!(!printed.contains("never asked"));
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_idle_session_reports_not_ready() {
        let mut session = QaSession::new(
            SessionConfig::default(),
            Arc::new(LetterEmbedder),
            Arc::new(CountingGenerator::default()),
        );
        let input: &[u8] = b"anyone there?\n";
        let mut output = Vec::new();

        run_loop(&mut session, input, &mut output, &ReplOptions::default())
            .await
            .unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Error: no document has been indexed"));
    }
}
