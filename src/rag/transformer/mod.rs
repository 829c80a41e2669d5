//! Query transformation
//!
//! Turns the user's query into the queries actually sent to routing:
//! - `DefaultQueryTransformer`: the query as-is
//! - `CompressingQueryTransformer`: folds conversation history into a
//!   self-contained query
//! - `ExpandingQueryTransformer`: asks the model for alternate phrasings

pub mod compressing;
pub mod expanding;

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::Query;

pub use compressing::CompressingQueryTransformer;
pub use expanding::ExpandingQueryTransformer;

/// One query in, zero or more queries out
#[async_trait]
pub trait QueryTransformer: Send + Sync {
    async fn transform(&self, query: &Query) -> Result<Vec<Query>>;
}

/// Passes the query through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQueryTransformer;

impl DefaultQueryTransformer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryTransformer for DefaultQueryTransformer {
    async fn transform(&self, query: &Query) -> Result<Vec<Query>> {
        Ok(vec![query.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, Metadata};

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let query = Query::new("hello", Metadata::new(ChatMessage::user("hello")));
        let queries = DefaultQueryTransformer::new().transform(&query).await.unwrap();
        assert_eq!(queries, vec![query]);
    }
}
