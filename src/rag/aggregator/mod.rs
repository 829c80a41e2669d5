//! Content aggregation
//!
//! Merges everything retrieved for every query into the final list handed
//! to the injector. The input map has no meaningful iteration order, so
//! every aggregator here first puts queries into canonical order (the
//! total ordering of [`Query`]) and produces the same output no matter
//! which retrieval finished first.

pub mod fusion;
pub mod reranking;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::errors::Result;
use crate::types::{Content, Query, QueryContents};

pub use fusion::ReciprocalRankFusionAggregator;
pub use reranking::{ContentScorer, KeywordOverlapScorer, ReRankingContentAggregator};

/// All retrieved content in, one ordered list out
#[async_trait]
pub trait ContentAggregator: Send + Sync {
    async fn aggregate(&self, contents: QueryContents) -> Result<Vec<Content>>;
}

/// Queries in canonical order with their per-retriever lists
pub(crate) fn canonical_order(contents: QueryContents) -> Vec<(Query, Vec<Vec<Content>>)> {
    let mut entries: Vec<_> = contents.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Concatenates all content and drops repeats
///
/// Queries are visited in canonical order and each query's lists in router
/// order. When the same content (same text and metadata) shows up more than
/// once, only its first occurrence is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContentAggregator;

impl DefaultContentAggregator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentAggregator for DefaultContentAggregator {
    async fn aggregate(&self, contents: QueryContents) -> Result<Vec<Content>> {
        let mut seen: HashSet<Content> = HashSet::new();
        let mut aggregated = Vec::new();

        for (_, lists) in canonical_order(contents) {
            for content in lists.into_iter().flatten() {
                if seen.insert(content.clone()) {
                    aggregated.push(content);
                }
            }
        }

        Ok(aggregated)
    }
}
