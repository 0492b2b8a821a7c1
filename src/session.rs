//! Question answering session over a single document.
//!
//! A session moves through `Idle -> Ready -> Processing -> Ready` and ends in
//! `Terminated`. Building the index is the only way out of `Idle`; a failed
//! build leaves the session `Idle`. Errors while answering a question are
//! reported as a [`QueryOutcome::Failed`] and never end the session.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::Settings;
use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{PagewiseError, Result};
use crate::rag::{Answer, Generator, Retriever, DEFAULT_TOP_K};
use crate::vector_store::VectorIndex;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, instrument, warn};

/// Answer text used when retrieval finds nothing above the score threshold.
const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant passages in the document for this question.";

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No index has been built yet.
    Idle,
    /// Index built, waiting for a question.
    Ready,
    /// A question is being answered.
    Processing,
    /// The caller ended the session.
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Processing => write!(f, "processing"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Settings a session needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub min_score: Option<f32>,
    /// Upper bound for each embedding or generation call made by a question.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            min_score: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            chunking: ChunkingConfig::from(&settings.chunking),
            top_k: settings.retrieval.top_k,
            min_score: settings.retrieval.min_score,
            request_timeout: settings.session.request_timeout(),
        }
    }
}

/// What a successful index build produced.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub source: String,
    pub pages: usize,
    pub chunks: usize,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
}

/// Result of submitting one question.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// The question was answered.
    Answered(Answer),
    /// Retrieval or generation failed; the session is still usable.
    Failed { question: String, message: String },
    /// Blank question; nothing was called.
    Rejected,
    /// No index has been built yet.
    NotReady,
    /// The session has ended.
    Terminated,
}

/// Counters for what a session has produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub answered: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Cloneable handle for ending a session from another task.
///
/// Termination takes effect once any in-flight question has completed.
#[derive(Debug, Clone, Default)]
pub struct Terminator {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Terminator {
    /// Request termination.
    pub fn terminate(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until termination is requested.
    pub async fn requested(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Interactive question answering over one indexed document.
pub struct QaSession {
    config: SessionConfig,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    retriever: Option<Retriever>,
    state: SessionState,
    terminator: Terminator,
    stats: SessionStats,
}

impl QaSession {
    /// Create an idle session.
    pub fn new(
        config: SessionConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            embedder,
            generator,
            retriever: None,
            state: SessionState::Idle,
            terminator: Terminator::default(),
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The index questions are answered from, once built.
    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.retriever.as_ref().map(|r| r.index())
    }

    /// Handle that can end this session from elsewhere.
    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Chunk and index a document, moving the session to `Ready`.
    ///
    /// On failure the session stays `Idle` and no partial index is kept.
    #[instrument(skip(self, document), fields(source = %document.source))]
    pub async fn load(&mut self, document: &Document) -> Result<IndexSummary> {
        self.expect_idle()?;

        let chunker = RecursiveChunker::new(self.config.chunking)?;
        let chunks = chunker.split(document);
        info!("Split document into {} chunks", chunks.len());

        let index = VectorIndex::build(chunks, self.embedder.as_ref()).await?;
        let summary = IndexSummary {
            source: document.source.clone(),
            pages: document.pages.len(),
            chunks: index.len(),
            dimensions: index.dimensions(),
            built_at: index.built_at(),
        };

        self.install(Arc::new(index));
        Ok(summary)
    }

    /// Use an index built elsewhere, for example one shared with other sessions.
    pub fn attach_index(&mut self, index: Arc<VectorIndex>) -> Result<()> {
        self.expect_idle()?;
        if index.is_empty() {
            return Err(PagewiseError::IndexBuild("Index is empty".to_string()));
        }
        self.install(index);
        Ok(())
    }

    /// Answer one question.
    ///
    /// Never returns an error: failures are reported in the outcome and the
    /// session goes back to `Ready`.
    pub async fn ask(&mut self, question: &str) -> QueryOutcome {
        if self.terminator.is_requested() {
            self.state = SessionState::Terminated;
        }

        match self.state {
            SessionState::Terminated => return QueryOutcome::Terminated,
            SessionState::Idle => return QueryOutcome::NotReady,
            SessionState::Ready | SessionState::Processing => {}
        }

        let question = question.trim();
        if question.is_empty() {
            self.stats.rejected += 1;
            return QueryOutcome::Rejected;
        }

        self.state = SessionState::Processing;
        let outcome = match self.answer(question).await {
            Ok(answer) => {
                self.stats.answered += 1;
                QueryOutcome::Answered(answer)
            }
            Err(e) => {
                warn!(recoverable = e.is_recoverable(), "Question failed: {}", e);
                self.stats.failed += 1;
                QueryOutcome::Failed {
                    question: question.to_string(),
                    message: e.to_string(),
                }
            }
        };

        self.state = if self.terminator.is_requested() {
            SessionState::Terminated
        } else {
            SessionState::Ready
        };

        outcome
    }

    /// End the session. Later questions return [`QueryOutcome::Terminated`].
    pub fn terminate(&mut self) {
        self.terminator.terminate();
        self.state = SessionState::Terminated;
    }

    #[instrument(skip(self))]
    async fn answer(&self, question: &str) -> Result<Answer> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| PagewiseError::Session("No index has been built".to_string()))?;

        let sources = self
            .bounded("Question embedding", retriever.retrieve(question))
            .await?;

        let mut answer = Answer {
            question: question.to_string(),
            text: NO_CONTEXT_ANSWER.to_string(),
            sources,
        };
        if answer.sources.is_empty() {
            return Ok(answer);
        }

        answer.text = self
            .bounded(
                "Answer generation",
                self.generator
                    .generate(question, &answer.supporting_chunks()),
            )
            .await?;

        info!("Answered with {} sources", answer.sources.len());
        Ok(answer)
    }

    /// Run a call under the configured timeout.
    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.request_timeout, call)
            .await
            .map_err(|_| PagewiseError::Timeout(what.to_string()))?
    }

    fn expect_idle(&self) -> Result<()> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Terminated => {
                Err(PagewiseError::Session("Session has been terminated".to_string()))
            }
            _ => Err(PagewiseError::Session(
                "Session already has an index".to_string(),
            )),
        }
    }

    fn install(&mut self, index: Arc<VectorIndex>) {
        let retriever = Retriever::new(Arc::clone(&self.embedder), index)
            .with_top_k(self.config.top_k)
            .with_min_score(self.config.min_score);
        self.retriever = Some(retriever);
        self.state = SessionState::Ready;
    }
}
