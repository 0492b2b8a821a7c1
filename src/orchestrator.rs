//! Pipeline orchestrator for Pagewise.
//!
//! Wires settings, prompts and the model clients together and turns a
//! document path into a ready question answering session.

use crate::config::{Prompts, Settings};
use crate::document::{load_document, Document};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::openai::create_client_with_timeout;
use crate::rag::{Generator, OpenAIGenerator};
use crate::session::{IndexSummary, QaSession, SessionConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the Pagewise pipeline.
pub struct Orchestrator {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the OpenAI API.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let client = create_client_with_timeout(settings.session.request_timeout())?;

        let embedder = OpenAIEmbedder::with_client(
            client.clone(),
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )
        .with_batching(
            settings.embedding.batch_size,
            settings.embedding.max_concurrent_requests,
        );

        let generator = OpenAIGenerator::with_client(client, &settings.generation.model)
            .with_temperature(settings.generation.temperature)
            .with_prompts(prompts);

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.generation.model
        );

        Ok(Self {
            settings,
            embedder: Arc::new(embedder),
            generator: Arc::new(generator),
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            settings,
            embedder,
            generator,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        self.generator.clone()
    }

    /// Session configuration derived from the settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::from_settings(&self.settings)
    }

    /// Create an idle session using this orchestrator's components.
    pub fn new_session(&self) -> QaSession {
        QaSession::new(self.session_config(), self.embedder(), self.generator())
    }

    /// Load a document, index it and return a session ready for questions.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn open_session(&self, path: &Path) -> Result<(QaSession, IndexSummary)> {
        let document = load_document(path).await?;
        self.open_session_for(&document).await
    }

    /// Index an already loaded document.
    pub async fn open_session_for(&self, document: &Document) -> Result<(QaSession, IndexSummary)> {
        let mut session = self.new_session();
        let summary = session.load(document).await?;

        info!(
            "Indexed {} chunks from {} pages of {}",
            summary.chunks, summary.pages, summary.source
        );

        Ok((session, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::error::PagewiseError;
    use crate::session::{QueryOutcome, SessionState};
    use async_trait::async_trait;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, question: &str, supporting: &[Arc<Chunk>]) -> Result<String> {
            Ok(format!("{} ({} chunks)", question, supporting.len()))
        }
    }

    fn orchestrator(settings: Settings) -> Result<Orchestrator> {
        Orchestrator::with_components(settings, Arc::new(LengthEmbedder), Arc::new(EchoGenerator))
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = Settings::default();
        settings.chunking.overlap_size = settings.chunking.max_chunk_size;

        let result = orchestrator(settings);
        assert!(matches!(result, Err(PagewiseError::Config(_))));
    }

    #[test]
    fn test_session_config_follows_settings() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 7;
        settings.session.request_timeout_secs = 9;

        let config = orchestrator(settings).unwrap().session_config();
        assert_eq!(config.top_k, 7);
        assert_eq!(config.request_timeout.as_secs(), 9);
        assert_eq!(config.chunking.max_chunk_size, 1000);
    }

    #[tokio::test]
    async fn test_open_session_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "First page.\u{000C}Second page.").unwrap();

        let orchestrator = orchestrator(Settings::default()).unwrap();
        let (mut session, summary) = orchestrator.open_session(&path).await.unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.chunks, 2);
        assert_eq!(session.state(), SessionState::Ready);

        let QueryOutcome::Answered(answer) = session.ask("which page?").await else {
            panic!("expected an answer");
        };
        assert_eq!(answer.text, "which page? (2 chunks)");
    }

    #[tokio::test]
    async fn test_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Settings::default()).unwrap();

        let err = orchestrator
            .open_session(&dir.path().join("absent.txt"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PagewiseError::DocumentNotFound(_)));
    }
}
