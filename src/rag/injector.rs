//! Content injection into the outgoing message
//!
//! Renders the aggregated content into the prompt sent to the model.
//! Without content the message goes out untouched.

use tracing::debug;

use crate::errors::Result;
use crate::prompt::PromptTemplate;
use crate::types::{ChatMessage, Content};

/// Built-in injection prompt (`{{userMessage}}`, `{{contents}}`)
pub const DEFAULT_INJECTION_PROMPT: &str =
    "{{userMessage}}\n\nAnswer using the following information:\n{{contents}}";

/// Merges retrieved content into a chat message
pub trait ContentInjector: Send + Sync {
    fn inject(&self, contents: &[Content], message: ChatMessage) -> Result<ChatMessage>;
}

/// Template-based injector
#[derive(Debug)]
pub struct DefaultContentInjector {
    template: PromptTemplate,
    metadata_keys: Vec<String>,
}

impl DefaultContentInjector {
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_INJECTION_PROMPT, Vec::new())
    }

    /// `metadata_keys` selects which content metadata is rendered, in order
    pub fn with_config(template: &str, metadata_keys: Vec<String>) -> Result<Self> {
        Ok(Self {
            template: PromptTemplate::new(template)?,
            metadata_keys,
        })
    }

    /// Format a single content
    fn format_content(&self, content: &Content) -> String {
        if self.metadata_keys.is_empty() {
            return content.text().to_string();
        }

        let mut lines: Vec<String> = self
            .metadata_keys
            .iter()
            .filter_map(|key| {
                content
                    .metadata_value(key)
                    .map(|value| format!("{}: {}", key, value))
            })
            .collect();
        lines.push(format!("content: {}", content.text()));

        lines.join("\n")
    }

    pub fn format_contents(&self, contents: &[Content]) -> String {
        contents
            .iter()
            .map(|content| self.format_content(content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl ContentInjector for DefaultContentInjector {
    fn inject(&self, contents: &[Content], message: ChatMessage) -> Result<ChatMessage> {
        if contents.is_empty() {
            return Ok(message);
        }

        let formatted = self.format_contents(contents);
        let user_message = message.text().unwrap_or_default();
        let prompt = self.template.render(&[
            ("userMessage", user_message),
            ("contents", formatted.as_str()),
        ])?;

        debug!(contents = contents.len(), prompt_len = prompt.len(), "Content injected");

        Ok(match message {
            ChatMessage::User { name, .. } => ChatMessage::User { text: prompt, name },
            _ => ChatMessage::user(prompt),
        })
    }
}
