//! JSON documents with explicit pages.
//!
//! Accepts either `{"pages": [{"page": 3, "text": "..."}]}` or a bare array of
//! page strings.

use super::{has_extension, read_utf8, Document, DocumentLoader, Page};
use crate::error::{PagewiseError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Paged { pages: Vec<JsonPage> },
    Texts(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct JsonPage {
    #[serde(default, alias = "number")]
    page: Option<u32>,
    text: String,
}

/// Loader for JSON page dumps.
pub struct JsonLoader;

impl JsonLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(source: &str, content: &str) -> Result<Document> {
        let parsed: JsonDocument = serde_json::from_str(content).map_err(|e| {
            PagewiseError::DocumentParse(format!("{} is not a valid page dump: {}", source, e))
        })?;

        Ok(match parsed {
            JsonDocument::Paged { pages } => Document::new(
                source,
                pages
                    .into_iter()
                    .map(|p| Page::new(p.page, p.text))
                    .collect(),
            ),
            JsonDocument::Texts(texts) => Document::from_page_texts(source, texts),
        })
    }
}

impl Default for JsonLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for JsonLoader {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    async fn load(&self, path: &Path) -> Result<Document> {
        let content = read_utf8(path).await?;
        Self::parse(&path.display().to_string(), &content)
    }
}
