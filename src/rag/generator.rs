//! Answer generation from a question and its supporting chunks.

use super::context::format_context_for_prompt;
use crate::chunking::Chunk;
use crate::config::{GenerationSettings, Prompts};
use crate::error::{PagewiseError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Trait for answer generation.
///
/// Implementations may be slow and may fail transiently; callers decide
/// whether to retry.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Write an answer to `question` grounded in `supporting` chunks.
    async fn generate(&self, question: &str, supporting: &[Arc<Chunk>]) -> Result<String>;
}

/// Chat-completion based generator.
///
/// All supporting chunks are placed in a single prompt.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIGenerator {
    /// Create a new generator with the given model.
    pub fn new(model: &str) -> Result<Self> {
        Ok(Self::with_client(create_client()?, model))
    }

    /// Create a generator that reuses an existing client.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: 0.0,
            prompts: Prompts::default(),
        }
    }

    /// Create a generator from the `[generation]` settings section.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self::new(&settings.model)?.with_temperature(settings.temperature))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the user prompt for a question.
    pub fn render_user_prompt(&self, question: &str, supporting: &[Arc<Chunk>]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(supporting));
        self.prompts.render_with_custom(&self.prompts.rag.user, &vars)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, supporting), fields(model = %self.model, chunks = supporting.len()))]
    async fn generate(&self, question: &str, supporting: &[Arc<Chunk>]) -> Result<String> {
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.system, &HashMap::new());
        let user_prompt = self.render_user_prompt(question, supporting);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PagewiseError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| PagewiseError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| PagewiseError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            PagewiseError::Generation(format!("Chat completion failed: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| PagewiseError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated answer ({} chars)", answer.len());
        Ok(answer)
    }
}
