//! Re-ranking aggregation
//!
//! Fuses all retrieved lists with RRF, then scores every candidate against
//! a single scoring query and keeps the best ones.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::config::DEFAULT_RRF_K;
use crate::errors::{RagError, Result};
use crate::rag::aggregator::fusion::{fuse, ranked_lists};
use crate::rag::aggregator::ContentAggregator;
use crate::types::{Content, Query, QueryContents};

/// Scores content relevance to a query
#[async_trait]
pub trait ContentScorer: Send + Sync {
    /// One score per content, in the same order
    async fn score(&self, query: &str, contents: &[Content]) -> Result<Vec<f64>>;
}

/// Fraction of the query's significant words found in the content
///
/// Words shorter than four characters are ignored; matching is
/// case-insensitive substring matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordOverlapScorer;

impl KeywordOverlapScorer {
    pub fn new() -> Self {
        Self
    }

    fn score_one(keywords: &HashSet<String>, content: &Content) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }

        let content_lower = content.text().to_lowercase();
        let matches = keywords
            .iter()
            .filter(|word| content_lower.contains(word.as_str()))
            .count();

        matches as f64 / keywords.len() as f64
    }
}

#[async_trait]
impl ContentScorer for KeywordOverlapScorer {
    async fn score(&self, query: &str, contents: &[Content]) -> Result<Vec<f64>> {
        let keywords: HashSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|word| word.chars().count() > 3)
            .collect();

        Ok(contents
            .iter()
            .map(|content| Self::score_one(&keywords, content))
            .collect())
    }
}

/// Fuse, score against the query, filter and truncate
pub struct ReRankingContentAggregator {
    scorer: Arc<dyn ContentScorer>,
    rrf_k: u32,
    min_score: Option<f64>,
    max_results: Option<usize>,
}

impl ReRankingContentAggregator {
    pub fn new(scorer: Arc<dyn ContentScorer>) -> Self {
        Self {
            scorer,
            rrf_k: DEFAULT_RRF_K,
            min_score: None,
            max_results: None,
        }
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// `max_results` must be greater than zero
    pub fn with_max_results(mut self, max_results: usize) -> Result<Self> {
        if max_results == 0 {
            return Err(RagError::Config("max_results must be > 0".to_string()));
        }
        self.max_results = Some(max_results);
        Ok(self)
    }

    pub fn with_rrf_k(mut self, rrf_k: u32) -> Self {
        self.rrf_k = rrf_k;
        self
    }

    /// The only query, or the user's message when there were several
    ///
    /// Queries are searched in canonical order.
    fn scoring_query(contents: &QueryContents) -> Result<String> {
        let mut queries: Vec<&Query> = contents.keys().collect();
        queries.sort();

        if let [query] = queries.as_slice() {
            return Ok(query.text().to_string());
        }

        queries
            .into_iter()
            .filter_map(|query| query.metadata())
            .find_map(|metadata| metadata.chat_message.user_text())
            .map(str::to_string)
            .ok_or_else(|| {
                RagError::Config(format!(
                    "cannot pick a scoring query among {} queries without a user message",
                    contents.len()
                ))
            })
    }
}

#[async_trait]
impl ContentAggregator for ReRankingContentAggregator {
    async fn aggregate(&self, contents: QueryContents) -> Result<Vec<Content>> {
        let has_content = contents.values().flatten().any(|list| !list.is_empty());
        if !has_content {
            return Ok(Vec::new());
        }

        let scoring_query = Self::scoring_query(&contents)?;
        let candidates: Vec<Content> = fuse(&ranked_lists(contents), self.rrf_k)
            .into_iter()
            .map(|fused| fused.content)
            .collect();

        let scores = self.scorer.score(&scoring_query, &candidates).await?;
        if scores.len() != candidates.len() {
            return Err(RagError::Generic(format!(
                "scorer returned {} scores for {} contents",
                scores.len(),
                candidates.len()
            )));
        }

        let mut scored: Vec<(Content, f64)> = candidates
            .into_iter()
            .zip(scores)
            .filter(|(_, score)| self.min_score.map_or(true, |min| *score >= min))
            .collect();

        // Stable: equal scores keep fused order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(max) = self.max_results {
            scored.truncate(max);
        }

        debug!(
            scoring_query = scoring_query.as_str(),
            kept = scored.len(),
            "Content re-ranked"
        );

        Ok(scored.into_iter().map(|(content, _)| content).collect())
    }
}
