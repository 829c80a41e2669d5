//! Content retrieval boundary
//!
//! Retrieval itself (vector search, full text, web search...) lives outside
//! this crate. The augmentor only relies on this contract.

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::{Content, Query};

/// Maps one query to the content it finds
#[async_trait]
pub trait ContentRetriever: Send + Sync {
    async fn retrieve(&self, query: &Query) -> Result<Vec<Content>>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
