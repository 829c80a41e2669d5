//! Text-completion collaborator
//!
//! The LLM-driven transformer and router variants only need "send prompt
//! text, get response text". Provider adapters implement this trait outside
//! the crate and own their own timeouts and retries.

use async_trait::async_trait;

use crate::errors::Result;

/// Prompt in, response text out
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
