//! Chat message types
//!
//! A read-only view of the conversation the augmentor works on: who said
//! what, and enough structure to tell user turns apart from everything else.

use serde::{Deserialize, Serialize};

/// Tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model
    pub arguments: String,
}

/// Kind of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    System,
    User,
    Ai,
    ToolResult,
}

/// Messages exchanged between the user, the model and tools
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    /// System instructions
    System { text: String },

    /// Message authored by the user
    User {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Model reply, possibly only carrying tool calls
    Ai {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },

    /// Output of a tool execution
    ToolResult {
        id: String,
        tool_name: String,
        text: String,
    },
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        ChatMessage::System { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage::User {
            text: text.into(),
            name: None,
        }
    }

    pub fn named_user(name: impl Into<String>, text: impl Into<String>) -> Self {
        ChatMessage::User {
            text: text.into(),
            name: Some(name.into()),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        ChatMessage::Ai {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Model turn that only requests tool executions
    pub fn ai_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        ChatMessage::Ai {
            text: None,
            tool_calls,
        }
    }

    pub fn tool_result(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        ChatMessage::ToolResult {
            id: id.into(),
            tool_name: tool_name.into(),
            text: text.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            ChatMessage::System { .. } => MessageKind::System,
            ChatMessage::User { .. } => MessageKind::User,
            ChatMessage::Ai { .. } => MessageKind::Ai,
            ChatMessage::ToolResult { .. } => MessageKind::ToolResult,
        }
    }

    /// Text carried by the message, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatMessage::System { text }
            | ChatMessage::User { text, .. }
            | ChatMessage::ToolResult { text, .. } => Some(text.as_str()),
            ChatMessage::Ai { text, .. } => text.as_deref(),
        }
    }

    /// Plain text of a user message; `None` for every other kind
    pub fn user_text(&self) -> Option<&str> {
        match self {
            ChatMessage::User { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}
