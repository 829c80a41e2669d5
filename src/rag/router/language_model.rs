//! Model-driven query routing
//!
//! Each retriever is described in plain language. The model sees the
//! numbered descriptions and answers with the option numbers that fit the
//! query, e.g. `1,3`. Anything else is a routing failure handled by the
//! configured [`FallbackStrategy`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::completion::TextCompleter;
use crate::errors::{RagError, Result};
use crate::prompt::PromptTemplate;
use crate::rag::retrieval::ContentRetriever;
use crate::rag::router::{FallbackStrategy, QueryRouter};
use crate::types::Query;

/// Built-in routing prompt (`{{options}}`, `{{query}}`)
pub const DEFAULT_ROUTING_PROMPT: &str = "\
Given the user query, pick the data source(s) most likely to hold the information needed to answer it:
{{options}}
Answer with a single option number, or several option numbers separated by commas, and nothing else.
User query: {{query}}";

struct RouteOption {
    retriever: Arc<dyn ContentRetriever>,
    description: String,
}

/// Routes queries by asking the model which retrievers fit
pub struct LanguageModelQueryRouter {
    completer: Arc<dyn TextCompleter>,
    template: PromptTemplate,
    options: Vec<RouteOption>,
    rendered_options: String,
    fallback: FallbackStrategy,
}

impl LanguageModelQueryRouter {
    /// Options are numbered from 1 in the order given; descriptions must not be blank
    pub fn new(
        completer: Arc<dyn TextCompleter>,
        options: Vec<(Arc<dyn ContentRetriever>, String)>,
    ) -> Result<Self> {
        if options.is_empty() {
            return Err(RagError::Config(
                "language model router needs at least one retriever".to_string(),
            ));
        }

        let mut route_options = Vec::with_capacity(options.len());
        for (retriever, description) in options {
            if description.trim().is_empty() {
                return Err(RagError::Config(format!(
                    "retriever '{}' needs a non-blank description",
                    retriever.name()
                )));
            }
            route_options.push(RouteOption {
                retriever,
                description,
            });
        }

        let rendered_options = route_options
            .iter()
            .enumerate()
            .map(|(idx, option)| format!("{}: {}", idx + 1, option.description))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            completer,
            template: PromptTemplate::new(DEFAULT_ROUTING_PROMPT)?,
            options: route_options,
            rendered_options,
            fallback: FallbackStrategy::default(),
        })
    }

    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_template(mut self, template: &str) -> Result<Self> {
        self.template = PromptTemplate::new(template)?;
        Ok(self)
    }

    async fn try_route(&self, query: &Query) -> Result<Vec<Arc<dyn ContentRetriever>>> {
        let prompt = self.template.render(&[
            ("options", self.rendered_options.as_str()),
            ("query", query.text()),
        ])?;
        let response = self.completer.complete(&prompt).await?;
        self.parse(&response)
    }

    /// Map `"1, 3"` to the first and third retriever
    fn parse(&self, response: &str) -> Result<Vec<Arc<dyn ContentRetriever>>> {
        let mut selected: Vec<usize> = Vec::new();

        for token in response.split(',').map(str::trim) {
            let number: usize = token.parse().map_err(|_| {
                RagError::Routing(format!("'{}' is not an option number", token))
            })?;

            let index = number
                .checked_sub(1)
                .filter(|idx| *idx < self.options.len())
                .ok_or_else(|| {
                    RagError::Routing(format!(
                        "option {} is outside 1..={}",
                        number,
                        self.options.len()
                    ))
                })?;

            if !selected.contains(&index) {
                selected.push(index);
            }
        }

        Ok(selected
            .into_iter()
            .map(|idx| self.options[idx].retriever.clone())
            .collect())
    }

    fn all_retrievers(&self) -> Vec<Arc<dyn ContentRetriever>> {
        self.options.iter().map(|o| o.retriever.clone()).collect()
    }
}

#[async_trait]
impl QueryRouter for LanguageModelQueryRouter {
    async fn route(&self, query: &Query) -> Result<Vec<Arc<dyn ContentRetriever>>> {
        let err = match self.try_route(query).await {
            Ok(retrievers) => {
                debug!(query = query.text(), selected = retrievers.len(), "Query routed");
                return Ok(retrievers);
            }
            Err(err) => err,
        };

        match self.fallback {
            FallbackStrategy::DoNotRoute => {
                warn!(query = query.text(), error = %err, "Routing failed, skipping retrieval");
                Ok(Vec::new())
            }
            FallbackStrategy::RouteToAll => {
                warn!(query = query.text(), error = %err, "Routing failed, routing to all retrievers");
                Ok(self.all_retrievers())
            }
            FallbackStrategy::Fail => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::{names, ScriptedCompleter, StaticRetriever};

    fn four_options() -> Vec<(Arc<dyn ContentRetriever>, String)> {
        ["one", "two", "three", "four"]
            .iter()
            .map(|name| {
                (
                    StaticRetriever::shared(name, &[]),
                    format!("everything about {}", name),
                )
            })
            .collect()
    }

    fn router(response: &str, fallback: FallbackStrategy) -> LanguageModelQueryRouter {
        let completer = Arc::new(ScriptedCompleter::replying(response));
        LanguageModelQueryRouter::new(completer, four_options())
            .unwrap()
            .with_fallback(fallback)
    }

    #[tokio::test]
    async fn test_routes_to_selected_options() {
        let router = router("1,3", FallbackStrategy::DoNotRoute);
        let route = router.route(&Query::from_text("q")).await.unwrap();
        assert_eq!(names(&route), vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_whitespace_and_duplicates_tolerated() {
        let router = router(" 2 , 4,2 ", FallbackStrategy::Fail);
        let route = router.route(&Query::from_text("q")).await.unwrap();
        assert_eq!(names(&route), vec!["two", "four"]);
    }

    #[tokio::test]
    async fn test_unparsable_do_not_route() {
        let router = router("the first one", FallbackStrategy::DoNotRoute);
        let route = router.route(&Query::from_text("q")).await.unwrap();
        assert!(route.is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_route_to_all() {
        let router = router("the first one", FallbackStrategy::RouteToAll);
        let route = router.route(&Query::from_text("q")).await.unwrap();
        assert_eq!(names(&route), vec!["one", "two", "three", "four"]);
    }

    #[tokio::test]
    async fn test_unparsable_fail() {
        let router = router("the first one", FallbackStrategy::Fail);
        let result = router.route(&Query::from_text("q")).await;
        assert!(matches!(result, Err(RagError::Routing(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_goes_through_fallback() {
        let failing = router("2,7", FallbackStrategy::Fail);
        assert!(matches!(
            failing.route(&Query::from_text("q")).await,
            Err(RagError::Routing(_))
        ));

        let zero = router("0", FallbackStrategy::DoNotRoute);
        assert!(zero.route(&Query::from_text("q")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completer_error_propagates_unchanged_on_fail() {
        let completer = Arc::new(ScriptedCompleter::failing("rate limited"));
        let router = LanguageModelQueryRouter::new(completer, four_options())
            .unwrap()
            .with_fallback(FallbackStrategy::Fail);

        match router.route(&Query::from_text("q")).await {
            Err(RagError::Completion(message)) => assert_eq!(message, "rate limited"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn test_prompt_lists_numbered_options() {
        let completer = Arc::new(ScriptedCompleter::replying("1"));
        let router = LanguageModelQueryRouter::new(completer.clone(), four_options()).unwrap();

        router.route(&Query::from_text("who painted it?")).await.unwrap();

        let prompt = completer.last_prompt().unwrap();
        assert!(prompt.contains("1: everything about one\n2: everything about two"));
        assert!(prompt.contains("4: everything about four"));
        assert!(prompt.contains("User query: who painted it?"));
    }

    #[test]
    fn test_blank_description_rejected() {
        let completer = Arc::new(ScriptedCompleter::replying("1"));
        let options = vec![(StaticRetriever::shared("docs", &[]), "   ".to_string())];
        let result = LanguageModelQueryRouter::new(completer, options);
        assert!(matches!(result, Err(RagError::Config(_))));
    }
}
