pub mod anthropic;
pub mod claude_cli;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AiConfig;

pub use anthropic::AnthropicProvider;
pub use claude_cli::ClaudeCliProvider;

/// A text-generation backend.
///
/// `generate` never errors: failures are logged at debug level and collapse
/// to `None`, leaving the caller to decide what a missing result means.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Option<String>;
    fn is_available(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Build the provider the config names. Unknown values fall back to the
/// claude CLI.
pub fn provider_from_config(config: &AiConfig) -> Arc<dyn AiProvider> {
    match config.provider.as_str() {
        "anthropic" => Arc::new(AnthropicProvider::new(
            config.resolved_api_key(),
            config.model.clone(),
        )),
        _ => Arc::new(ClaudeCliProvider::new(config.model.clone())),
    }
}
