//! Reciprocal Rank Fusion: score = Σ 1/(k + rank)
//!
//! Every per-retriever list is treated as an independent ranking. Content
//! that ranks well in several lists floats to the top without having to
//! normalise scores across retrievers.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::DEFAULT_RRF_K;
use crate::errors::Result;
use crate::rag::aggregator::{canonical_order, ContentAggregator};
use crate::types::{Content, QueryContents};

/// A content item after fusion
#[derive(Debug, Clone, PartialEq)]
pub struct FusedContent {
    pub content: Content,
    /// Fused score (higher = more relevant)
    pub score: f64,
}

/// Fuse ranked lists, best first
///
/// Ranks are 1-based. Ties keep the order in which content was first seen.
pub fn fuse(lists: &[Vec<Content>], k: u32) -> Vec<FusedContent> {
    // content -> (score, first seen position)
    let mut scores: HashMap<&Content, (f64, usize)> = HashMap::new();
    let mut next_position = 0usize;

    for list in lists {
        for (idx, content) in list.iter().enumerate() {
            let rrf = 1.0 / (k as f64 + (idx + 1) as f64);
            let entry = scores.entry(content).or_insert_with(|| {
                next_position += 1;
                (0.0, next_position)
            });
            entry.0 += rrf;
        }
    }

    let mut fused: Vec<(&Content, f64, usize)> = scores
        .into_iter()
        .map(|(content, (score, position))| (content, score, position))
        .collect();

    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });

    fused
        .into_iter()
        .map(|(content, score, _)| FusedContent {
            content: content.clone(),
            score,
        })
        .collect()
}

/// Per-retriever lists of every query, in canonical query order
pub(crate) fn ranked_lists(contents: QueryContents) -> Vec<Vec<Content>> {
    canonical_order(contents)
        .into_iter()
        .flat_map(|(_, lists)| lists)
        .collect()
}

/// Aggregates by reciprocal rank fusion across all queries and retrievers
#[derive(Debug, Clone, Copy)]
pub struct ReciprocalRankFusionAggregator {
    k: u32,
}

impl ReciprocalRankFusionAggregator {
    pub fn new() -> Self {
        Self { k: DEFAULT_RRF_K }
    }

    /// Higher `k` flattens the advantage of top-ranked items
    pub fn with_k(k: u32) -> Self {
        Self { k }
    }

    pub fn k(&self) -> u32 {
        self.k
    }
}

impl Default for ReciprocalRankFusionAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentAggregator for ReciprocalRankFusionAggregator {
    async fn aggregate(&self, contents: QueryContents) -> Result<Vec<Content>> {
        let lists = ranked_lists(contents);
        Ok(fuse(&lists, self.k)
            .into_iter()
            .map(|fused| fused.content)
            .collect())
    }
}
