//! PDF documents, one page per PDF page.

use super::{has_extension, read_bytes, Document, DocumentLoader, Page};
use crate::error::{PagewiseError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// Loader for PDF files with a text layer.
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of every page, keeping the PDF's page numbers.
    ///
    /// A page whose text cannot be extracted is kept with empty text so the
    /// numbering of the following pages stays intact.
    pub fn parse(source: &str, bytes: &[u8]) -> Result<Document> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| PagewiseError::DocumentParse(format!("{} is not a readable PDF: {}", source, e)))?;

        let pages = pdf
            .get_pages()
            .into_keys()
            .map(|number| {
                let text = pdf.extract_text(&[number]).unwrap_or_else(|e| {
                    warn!("No text extracted from page {} of {}: {}", number, source, e);
                    String::new()
                });
                Page::new(Some(number), text)
            })
            .collect();

        Ok(Document::new(source, pages))
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    async fn load(&self, path: &Path) -> Result<Document> {
        let bytes = read_bytes(path).await?;
        let source = path.display().to_string();

        tokio::task::spawn_blocking(move || Self::parse(&source, &bytes))
            .await
            .map_err(|e| PagewiseError::DocumentParse(format!("PDF extraction task failed: {}", e)))?
    }
}
