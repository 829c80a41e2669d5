//! Conversation-aware query compression
//!
//! Follow-up questions like "How old is he?" are useless to a retriever on
//! their own. This transformer asks the model to rewrite the query into a
//! standalone one using the conversation so far.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::completion::TextCompleter;
use crate::errors::Result;
use crate::prompt::PromptTemplate;
use crate::rag::transformer::QueryTransformer;
use crate::types::{ChatMessage, Query};

/// Built-in compression prompt (`{{chatMemory}}`, `{{query}}`)
pub const DEFAULT_COMPRESSING_PROMPT: &str = "\
Read the conversation between the User and the AI, then read the new query from the User. \
Collect every detail, name and term from the conversation that the new query depends on, \
and rewrite the query so that it is clear, concise and fully self-contained for information retrieval.

Conversation:
{{chatMemory}}

User query: {{query}}

Reply with the rewritten query only. Do not add any prefix, quotes or explanation.";

/// Rewrites a query into a standalone one using chat history
pub struct CompressingQueryTransformer {
    completer: Arc<dyn TextCompleter>,
    template: PromptTemplate,
}

impl CompressingQueryTransformer {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Result<Self> {
        Self::with_template(completer, DEFAULT_COMPRESSING_PROMPT)
    }

    pub fn with_template(completer: Arc<dyn TextCompleter>, template: &str) -> Result<Self> {
        Ok(Self {
            completer,
            template: PromptTemplate::new(template)?,
        })
    }

    /// Render history as `User:` / `AI:` lines
    ///
    /// System messages, tool results and model turns without text are left
    /// out.
    pub fn format_chat_memory(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .filter_map(|message| match message {
                ChatMessage::User { text, .. } => Some(format!("User: {}", text)),
                ChatMessage::Ai {
                    text: Some(text), ..
                } if !text.trim().is_empty() => Some(format!("AI: {}", text)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl QueryTransformer for CompressingQueryTransformer {
    async fn transform(&self, query: &Query) -> Result<Vec<Query>> {
        let history = query.chat_memory();
        if history.is_empty() {
            return Ok(vec![query.clone()]);
        }

        let transcript = Self::format_chat_memory(history);
        if transcript.is_empty() {
            // Nothing the model could use
            return Ok(vec![query.clone()]);
        }

        let prompt = self
            .template
            .render(&[("chatMemory", transcript.as_str()), ("query", query.text())])?;
        let compressed = self.completer.complete(&prompt).await?;

        debug!(
            original = query.text(),
            compressed = compressed.as_str(),
            history_len = history.len(),
            "Query compressed"
        );

        Ok(vec![query.rephrase(compressed)])
    }
}
