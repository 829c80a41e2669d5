//! Input and output of a single `augment()` call

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::content::Content;
use crate::types::messages::ChatMessage;
use crate::types::query::{Metadata, Query};

/// Content gathered per query; inner lists are per retriever, in router order.
///
/// Iteration order carries no meaning: queries are processed concurrently.
pub type QueryContents = HashMap<Query, Vec<Vec<Content>>>;

/// Request handed to the augmentor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationRequest {
    /// Must be a user message
    pub message: ChatMessage,
    pub metadata: Metadata,
}

impl AugmentationRequest {
    pub fn new(message: ChatMessage, metadata: Metadata) -> Self {
        Self { message, metadata }
    }

    /// Request whose metadata only carries the message itself
    pub fn from_message(message: ChatMessage) -> Self {
        let metadata = Metadata::new(message.clone());
        Self { message, metadata }
    }
}

/// Augmented message together with what was injected into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationResult {
    pub message: ChatMessage,
    pub contents: Vec<Content>,
}

impl AugmentationResult {
    /// Whether any content was injected
    pub fn is_augmented(&self) -> bool {
        !self.contents.is_empty()
    }
}
