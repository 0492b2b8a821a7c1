//! Source documents and the loaders that read them from disk.
//!
//! A document is an ordered list of pages. Loaders are picked by file
//! extension, the same way for every entry point.

mod json;
mod pdf;
mod text;

pub use json::JsonLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;

use crate::error::{PagewiseError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// One page of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number as printed to the user, if the source knows it.
    pub number: Option<u32>,
    /// Text content of the page.
    pub text: String,
}

impl Page {
    pub fn new(number: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A loaded document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Where the document came from (usually its path).
    pub source: String,
    /// Pages in reading order.
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(source: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            source: source.into(),
            pages,
        }
    }

    /// Build a document from page texts, numbering pages from 1.
    pub fn from_page_texts<I, S>(source: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page::new(Some(i as u32 + 1), text))
            .collect();
        Self::new(source, pages)
    }

    /// Raw text of the whole document, pages separated by blank lines.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total number of characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Trait for document loaders.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Check if this loader can read the given path.
    fn can_handle(&self, path: &Path) -> bool;

    /// Read and parse the document.
    async fn load(&self, path: &Path) -> Result<Document>;
}

/// Pick the loader for a path based on its extension.
pub fn detect_loader(path: &Path) -> Option<Box<dyn DocumentLoader>> {
    let text = TextLoader::new();
    if text.can_handle(path) {
        return Some(Box::new(text));
    }

    let json = JsonLoader::new();
    if json.can_handle(path) {
        return Some(Box::new(json));
    }

    let pdf = PdfLoader::new();
    if pdf.can_handle(path) {
        return Some(Box::new(pdf));
    }

    None
}

/// Load a document from disk.
///
/// Fails with [`PagewiseError::DocumentNotFound`] when the file is missing and
/// [`PagewiseError::DocumentParse`] when it cannot be read as a document.
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn load_document(path: &Path) -> Result<Document> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(PagewiseError::DocumentNotFound(path.display().to_string()));
    }

    let loader = detect_loader(path).ok_or_else(|| {
        PagewiseError::DocumentParse(format!(
            "Unsupported document type: {} (expected .txt, .md, .json or .pdf)",
            path.display()
        ))
    })?;

    let document = loader.load(path).await?;
    info!(
        "Loaded {} ({} pages, {} characters)",
        document.source,
        document.pages.len(),
        document.char_count()
    );
    Ok(document)
}

/// Check a file extension against a list, case-insensitively.
fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a file, mapping failures onto document errors.
async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PagewiseError::DocumentNotFound(path.display().to_string())
        } else {
            PagewiseError::DocumentParse(format!("Failed to read {}: {}", path.display(), e))
        }
    })
}

/// Read a file as UTF-8, mapping failures onto document errors.
async fn read_utf8(path: &Path) -> Result<String> {
    let bytes = read_bytes(path).await?;

    String::from_utf8(bytes).map_err(|e| {
        PagewiseError::DocumentParse(format!("{} is not valid UTF-8: {}", path.display(), e))
    })
}
