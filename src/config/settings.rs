//! Configuration settings for Pagewise.

use crate::error::{PagewiseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub document: DocumentSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
}

/// Source document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DocumentSettings {
    /// Document to load when none is given on the command line.
    pub path: Option<String>,
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_chunk_size: usize,
    /// Characters shared between consecutive chunks of a page.
    pub overlap_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 200,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum embedding requests in flight while building an index.
    pub max_concurrent_requests: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 100,
            max_concurrent_requests: 4,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Drop retrieved chunks scoring below this similarity.
    pub min_score: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat model used to write answers.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Keyword that ends the interactive loop (case-insensitive).
    pub exit_keyword: String,
    /// Upper bound for each embedding or generation call, in seconds.
    pub request_timeout_secs: u64,
    /// Characters of each source chunk shown under an answer.
    pub preview_chars: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            exit_keyword: "exit".to_string(),
            request_timeout_secs: 120,
            preview_chars: 150,
        }
    }
}

impl SessionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PagewiseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagewise")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Check sizing and session values before anything is built.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 {
            return Err(PagewiseError::Config(
                "chunking.max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(PagewiseError::Config(format!(
                "chunking.overlap_size ({}) must be less than chunking.max_chunk_size ({})",
                self.chunking.overlap_size, self.chunking.max_chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(PagewiseError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 || self.embedding.max_concurrent_requests == 0 {
            return Err(PagewiseError::Config(
                "embedding.batch_size and embedding.max_concurrent_requests must be at least 1"
                    .to_string(),
            ));
        }
        if self.session.request_timeout_secs == 0 {
            return Err(PagewiseError::Config(
                "session.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.session.exit_keyword.trim().is_empty() {
            return Err(PagewiseError::Config(
                "session.exit_keyword must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the document to load: the command-line value wins over the config file.
    pub fn document_path(&self, cli_path: Option<&str>) -> Result<PathBuf> {
        cli_path
            .or(self.document.path.as_deref())
            .filter(|p| !p.trim().is_empty())
            .map(Self::expand_path)
            .ok_or_else(|| {
                PagewiseError::Config(
                    "No document path given. Pass --document or set document.path in the config file."
                        .to_string(),
                )
            })
    }
}
