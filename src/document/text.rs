//! Plain text and markdown documents.
//!
//! Pages are separated by form feed characters, which is what most
//! text extraction tools emit between pages.

use super::{has_extension, read_utf8, Document, DocumentLoader, Page};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Supported text file extensions.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// Page separator.
const FORM_FEED: char = '\u{000C}';

/// Loader for UTF-8 text files.
pub struct TextLoader;

impl TextLoader {
    pub fn new() -> Self {
        Self
    }

    /// Split text into pages numbered from 1.
    pub fn parse(source: &str, content: &str) -> Document {
        let pages = content
            .split(FORM_FEED)
            .enumerate()
            .map(|(i, text)| Page::new(Some(i as u32 + 1), text))
            .collect();
        Document::new(source, pages)
    }
}

impl Default for TextLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for TextLoader {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, TEXT_EXTENSIONS)
    }

    async fn load(&self, path: &Path) -> Result<Document> {
        let content = read_utf8(path).await?;
        Ok(Self::parse(&path.display().to_string(), &content))
    }
}
