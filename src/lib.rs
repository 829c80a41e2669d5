//! ragbuddy - retrieval augmentation for chat messages
//!
//! Takes a user message and its conversation context, and before the
//! message is sent to a language model:
//!
//! - transforms the query (passthrough, compression, expansion)
//! - routes each query to content retrievers (static or model-driven)
//! - retrieves, dispatching to a worker pool only when there is more than
//!   one thing to do
//! - aggregates everything into one list (dedup, RRF, re-ranking)
//! - injects the list into the message
//!
//! [`RetrievalAugmentor::augment`] is the entry point.

pub mod errors;
pub mod types;
pub mod prompt;
pub mod completion;
pub mod config;
pub mod telemetry;
pub mod rag;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use types::{
    AugmentationRequest, AugmentationResult, ChatMessage, Content, Metadata, Query,
    QueryContents,
};
pub use completion::TextCompleter;
pub use config::RagConfig;
pub use rag::{RetrievalAugmentor, RetrievalAugmentorBuilder};
