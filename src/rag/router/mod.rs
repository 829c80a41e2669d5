//! Query routing
//!
//! Decides which retrievers see a query. An empty route means the query
//! is not retrieved for at all.

pub mod language_model;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{RagError, Result};
use crate::rag::retrieval::ContentRetriever;
use crate::types::Query;

pub use language_model::LanguageModelQueryRouter;

/// One query in, the retrievers that should handle it out
#[async_trait]
pub trait QueryRouter: Send + Sync {
    async fn route(&self, query: &Query) -> Result<Vec<Arc<dyn ContentRetriever>>>;
}

/// What a model-driven router does when it cannot produce a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Skip retrieval for the query
    #[default]
    DoNotRoute,
    /// Send the query to every known retriever
    RouteToAll,
    /// Propagate the error and abort the augmentation
    Fail,
}

/// Routes every query to the same fixed set of retrievers
pub struct DefaultQueryRouter {
    retrievers: Vec<Arc<dyn ContentRetriever>>,
}

impl DefaultQueryRouter {
    /// At least one retriever is required
    pub fn new(retrievers: Vec<Arc<dyn ContentRetriever>>) -> Result<Self> {
        if retrievers.is_empty() {
            return Err(RagError::Config(
                "default query router needs at least one retriever".to_string(),
            ));
        }
        Ok(Self { retrievers })
    }

    pub fn single(retriever: Arc<dyn ContentRetriever>) -> Self {
        Self {
            retrievers: vec![retriever],
        }
    }
}

#[async_trait]
impl QueryRouter for DefaultQueryRouter {
    async fn route(&self, _query: &Query) -> Result<Vec<Arc<dyn ContentRetriever>>> {
        Ok(self.retrievers.clone())
    }
}
