//! Error types for Pagewise.

use thiserror::Error;

/// Library-level error type for Pagewise operations.
#[derive(Error, Debug)]
pub enum PagewiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Index query failed: {0}")]
    IndexQuery(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl PagewiseError {
    /// Whether the error belongs to a single query and leaves the session usable.
    ///
    /// Everything else (configuration, document loading, index building) is
    /// fatal to starting a session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PagewiseError::IndexQuery(_)
                | PagewiseError::Embedding(_)
                | PagewiseError::Generation(_)
                | PagewiseError::Timeout(_)
                | PagewiseError::OpenAI(_)
                | PagewiseError::Http(_)
        )
    }

    /// Whether the error came from loading the source document.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            PagewiseError::DocumentNotFound(_) | PagewiseError::DocumentParse(_)
        )
    }
}

/// Result type alias for Pagewise operations.
pub type Result<T> = std::result::Result<T, PagewiseError>;
