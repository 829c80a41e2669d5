//! Query expansion into alternate phrasings

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::completion::TextCompleter;
use crate::config::DEFAULT_EXPANSION_COUNT;
use crate::errors::{RagError, Result};
use crate::prompt::PromptTemplate;
use crate::rag::transformer::QueryTransformer;
use crate::types::Query;

/// Built-in expansion prompt (`{{n}}`, `{{query}}`)
pub const DEFAULT_EXPANDING_PROMPT: &str = "\
Write {{n}} different versions of the user query below. \
Each version must keep the original meaning but use different wording, \
synonyms or sentence structure; they will be used to retrieve relevant documents. \
Put each version on its own line, with no numbering, bullets or any other formatting.
User query: {{query}}";

/// Asks the model for `n` rewordings of the query
pub struct ExpandingQueryTransformer {
    completer: Arc<dyn TextCompleter>,
    template: PromptTemplate,
    n: usize,
}

impl ExpandingQueryTransformer {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Result<Self> {
        Self::with_config(completer, DEFAULT_EXPANDING_PROMPT, DEFAULT_EXPANSION_COUNT)
    }

    /// `n` must be greater than zero
    pub fn with_config(completer: Arc<dyn TextCompleter>, template: &str, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RagError::Config(
                "number of query expansions must be > 0".to_string(),
            ));
        }

        Ok(Self {
            completer,
            template: PromptTemplate::new(template)?,
            n,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    fn parse(response: &str, query: &Query) -> Vec<Query> {
        response
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| query.rephrase(line))
            .collect()
    }
}

#[async_trait]
impl QueryTransformer for ExpandingQueryTransformer {
    async fn transform(&self, query: &Query) -> Result<Vec<Query>> {
        let n = self.n.to_string();
        let prompt = self
            .template
            .render(&[("query", query.text()), ("n", n.as_str())])?;
        let response = self.completer.complete(&prompt).await?;

        let queries = Self::parse(&response, query);
        debug!(requested = self.n, produced = queries.len(), "Query expanded");

        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::ScriptedCompleter;
    use crate::types::{ChatMessage, Metadata};

    fn sample_query() -> Query {
        Query::new(
            "original",
            Metadata::new(ChatMessage::user("original")).with_memory_id("s-1"),
        )
    }

    #[tokio::test]
    async fn test_expands_one_query_per_line() {
        let completer = Arc::new(ScriptedCompleter::replying("a\nb\nc"));
        let transformer = ExpandingQueryTransformer::new(completer.clone()).unwrap();
        let query = sample_query();

        let queries = transformer.transform(&query).await.unwrap();

        let texts: Vec<&str> = queries.iter().map(Query::text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(queries.iter().all(|q| q.metadata() == query.metadata()));

        let prompt = completer.last_prompt().unwrap();
        assert!(prompt.contains("Write 3 different versions"));
        assert!(prompt.contains("User query: original"));
    }

    #[tokio::test]
    async fn test_blank_lines_discarded() {
        let completer = Arc::new(ScriptedCompleter::replying("\n first \r\n\n   \nsecond\n"));
        let transformer = ExpandingQueryTransformer::new(completer).unwrap();

        let queries = transformer.transform(&sample_query()).await.unwrap();

        let texts: Vec<&str> = queries.iter().map(Query::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_response_yields_no_queries() {
        let completer = Arc::new(ScriptedCompleter::replying("  \n"));
        let transformer = ExpandingQueryTransformer::new(completer).unwrap();

        assert!(transformer.transform(&sample_query()).await.unwrap().is_empty());
    }

    #[test]
    fn test_zero_expansions_rejected() {
        let completer = Arc::new(ScriptedCompleter::replying(""));
        let result = ExpandingQueryTransformer::with_config(completer, DEFAULT_EXPANDING_PROMPT, 0);
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[tokio::test]
    async fn test_custom_n_in_prompt() {
        let completer = Arc::new(ScriptedCompleter::replying("x"));
        let transformer =
            ExpandingQueryTransformer::with_config(completer.clone(), "{{n}}:{{query}}", 5).unwrap();

        transformer.transform(&sample_query()).await.unwrap();
        assert_eq!(completer.last_prompt().unwrap(), "5:original");
        assert_eq!(transformer.n(), 5);
    }
}
