//! Configuration module for Pagewise.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, DocumentSettings, EmbeddingSettings, GenerationSettings, PromptSettings,
    RetrievalSettings, SessionSettings, Settings,
};
