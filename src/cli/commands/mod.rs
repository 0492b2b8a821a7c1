//! CLI command implementations.

mod ask;
mod chat;
mod chunks;
mod config;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use chunks::run_chunks;
pub use config::run_config;
pub use search::run_search;

use crate::config::Settings;

/// Apply per-command model and retrieval overrides on top of the loaded settings.
pub(crate) fn apply_overrides(
    mut settings: Settings,
    model: Option<String>,
    top_k: Option<usize>,
) -> Settings {
    if let Some(model) = model {
        settings.generation.model = model;
    }
    if let Some(top_k) = top_k {
        settings.retrieval.top_k = top_k;
    }
    settings
}
