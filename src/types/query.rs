//! Query and its contextual metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::messages::ChatMessage;

/// Context travelling with every query produced for one augmentation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Metadata {
    /// The message being augmented
    pub chat_message: ChatMessage,
    /// Conversation/session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    /// Prior messages, oldest first
    #[serde(default)]
    pub chat_memory: Vec<ChatMessage>,
    /// Caller-supplied attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(chat_message: ChatMessage) -> Self {
        Self {
            chat_message,
            memory_id: None,
            chat_memory: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_memory_id(mut self, memory_id: impl Into<String>) -> Self {
        self.memory_id = Some(memory_id.into());
        self
    }

    pub fn with_chat_memory(mut self, chat_memory: Vec<ChatMessage>) -> Self {
        self.chat_memory = chat_memory;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Text submitted to routers and retrievers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Query {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl Query {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata: Some(metadata),
        }
    }

    /// Query without any conversational context
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    /// New query with different text and the same metadata
    pub fn rephrase(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Conversation history, empty when there is no metadata
    pub fn chat_memory(&self) -> &[ChatMessage] {
        self.metadata
            .as_ref()
            .map(|m| m.chat_memory.as_slice())
            .unwrap_or(&[])
    }
}
