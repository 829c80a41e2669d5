//! Type definitions module
//!
//! Value types flowing through the augmentation pipeline. All of them are
//! created per `augment()` call and dropped afterwards.

pub mod messages;
pub mod query;
pub mod content;
pub mod augmentation;

// Re-export commonly used types
pub use messages::{ChatMessage, MessageKind, ToolCallRequest};
pub use query::{Metadata, Query};
pub use content::Content;
pub use augmentation::{AugmentationRequest, AugmentationResult, QueryContents};
