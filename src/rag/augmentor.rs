//! Retrieval augmentor: transform -> route -> retrieve -> aggregate -> inject
//!
//! # Concurrency Model
//!
//! The amount of parallel work is decided per call from what the
//! transformer and router return:
//!
//! - 1 query, 1 retriever: route and retrieve inline, nothing is dispatched
//! - 1 query, N retrievers: route inline, each retrieval dispatched to the
//!   worker pool, then joined
//! - N queries: one pipeline per query (route, then dispatch each retrieval)
//!   is dispatched to the pool; all pipelines run concurrently and are
//!   joined
//!
//! Any failure fails the whole call. Tasks already dispatched keep running,
//! their results are dropped.

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::completion::TextCompleter;
use crate::config::{AggregatorKind, RagConfig, RouterKind, TransformerKind};
use crate::errors::{RagError, Result};
use crate::rag::aggregator::{
    ContentAggregator, DefaultContentAggregator, KeywordOverlapScorer,
    ReRankingContentAggregator, ReciprocalRankFusionAggregator,
};
use crate::rag::injector::{ContentInjector, DefaultContentInjector, DEFAULT_INJECTION_PROMPT};
use crate::rag::pool::{dispatch, gather, TokioWorkerPool, WorkerPool};
use crate::rag::retrieval::ContentRetriever;
use crate::rag::router::{DefaultQueryRouter, LanguageModelQueryRouter, QueryRouter};
use crate::rag::transformer::compressing::DEFAULT_COMPRESSING_PROMPT;
use crate::rag::transformer::expanding::DEFAULT_EXPANDING_PROMPT;
use crate::rag::transformer::{
    CompressingQueryTransformer, DefaultQueryTransformer, ExpandingQueryTransformer,
    QueryTransformer,
};
use crate::types::{AugmentationRequest, AugmentationResult, Content, Query, QueryContents};

/// Entry point of the augmentation pipeline
///
/// Holds no per-call state; share it behind an `Arc` across tasks.
pub struct RetrievalAugmentor {
    query_transformer: Arc<dyn QueryTransformer>,
    query_router: Arc<dyn QueryRouter>,
    content_aggregator: Arc<dyn ContentAggregator>,
    content_injector: Arc<dyn ContentInjector>,
    worker_pool: Arc<dyn WorkerPool>,
}

impl RetrievalAugmentor {
    pub fn builder() -> RetrievalAugmentorBuilder {
        RetrievalAugmentorBuilder::default()
    }

    /// Augment a user message with retrieved content
    pub async fn augment(&self, request: AugmentationRequest) -> Result<AugmentationResult> {
        let request_id = Uuid::new_v4();
        self.run(request)
            .instrument(info_span!("augment", %request_id))
            .await
    }

    async fn run(&self, request: AugmentationRequest) -> Result<AugmentationResult> {
        let AugmentationRequest { message, metadata } = request;

        let text = message.user_text().ok_or_else(|| {
            RagError::InvalidInput(format!(
                "only user messages can be augmented, got {:?}",
                message.kind()
            ))
        })?;
        let query = Query::new(text, metadata);

        let queries = self.query_transformer.transform(&query).await?;
        debug!(queries = queries.len(), "Query transformed");

        let query_contents = self.process(queries).await?;

        let contents = self.content_aggregator.aggregate(query_contents).await?;
        let message = self.content_injector.inject(&contents, message)?;

        info!(contents = contents.len(), "Augmentation complete");

        Ok(AugmentationResult { message, contents })
    }

    /// Route and retrieve for every query
    async fn process(&self, queries: Vec<Query>) -> Result<QueryContents> {
        let mut query_contents = QueryContents::new();

        if queries.len() > 1 {
            let handles = queries
                .into_iter()
                .map(|query| {
                    let router = self.query_router.clone();
                    let pool = self.worker_pool.clone();
                    dispatch(self.worker_pool.as_ref(), async move {
                        let retrievers = router.route(&query).await?;
                        let lists = fan_out(pool.as_ref(), retrievers, &query).await?;
                        Ok::<_, RagError>((query, lists))
                    })
                })
                .collect();

            for (query, lists) in gather(handles).await? {
                // Expansion may produce the same query twice
                query_contents.entry(query).or_default().extend(lists);
            }

            return Ok(query_contents);
        }

        let Some(query) = queries.into_iter().next() else {
            return Ok(query_contents);
        };

        let mut retrievers = self.query_router.route(&query).await?;
        debug!(retrievers = retrievers.len(), "Single query routed");

        let lists = match retrievers.len() {
            0 => Vec::new(),
            1 => {
                let retriever = retrievers.remove(0);
                vec![retrieve(retriever.as_ref(), &query).await?]
            }
            _ => fan_out(self.worker_pool.as_ref(), retrievers, &query).await?,
        };
        query_contents.insert(query, lists);

        Ok(query_contents)
    }
}

async fn retrieve(retriever: &dyn ContentRetriever, query: &Query) -> Result<Vec<Content>> {
    match retriever.retrieve(query).await {
        Ok(contents) => {
            debug!(
                retriever = retriever.name(),
                query = query.text(),
                found = contents.len(),
                "Retrieved"
            );
            Ok(contents)
        }
        Err(err) => {
            warn!(retriever = retriever.name(), query = query.text(), error = %err, "Retrieval failed");
            Err(err)
        }
    }
}

/// Dispatch one retrieval per retriever and wait for all of them
async fn fan_out(
    pool: &dyn WorkerPool,
    retrievers: Vec<Arc<dyn ContentRetriever>>,
    query: &Query,
) -> Result<Vec<Vec<Content>>> {
    let handles = retrievers
        .into_iter()
        .map(|retriever| {
            let query = query.clone();
            dispatch(pool, async move { retrieve(retriever.as_ref(), &query).await })
        })
        .collect();

    gather(handles).await
}

/// Assembles a [`RetrievalAugmentor`]
///
/// Only the router is mandatory. Everything else defaults to:
/// passthrough transformer, [`DefaultContentAggregator`],
/// [`DefaultContentInjector`], ambient [`TokioWorkerPool`].
#[derive(Default)]
pub struct RetrievalAugmentorBuilder {
    query_transformer: Option<Arc<dyn QueryTransformer>>,
    query_router: Option<Arc<dyn QueryRouter>>,
    content_aggregator: Option<Arc<dyn ContentAggregator>>,
    content_injector: Option<Arc<dyn ContentInjector>>,
    worker_pool: Option<Arc<dyn WorkerPool>>,
}

impl RetrievalAugmentorBuilder {
    pub fn query_transformer(mut self, transformer: impl QueryTransformer + 'static) -> Self {
        self.query_transformer = Some(Arc::new(transformer));
        self
    }

    pub fn query_router(mut self, router: impl QueryRouter + 'static) -> Self {
        self.query_router = Some(Arc::new(router));
        self
    }

    /// Route every query to this single retriever
    pub fn content_retriever(mut self, retriever: Arc<dyn ContentRetriever>) -> Self {
        self.query_router = Some(Arc::new(DefaultQueryRouter::single(retriever)));
        self
    }

    pub fn content_aggregator(mut self, aggregator: impl ContentAggregator + 'static) -> Self {
        self.content_aggregator = Some(Arc::new(aggregator));
        self
    }

    pub fn content_injector(mut self, injector: impl ContentInjector + 'static) -> Self {
        self.content_injector = Some(Arc::new(injector));
        self
    }

    pub fn worker_pool(mut self, pool: impl WorkerPool + 'static) -> Self {
        self.worker_pool = Some(Arc::new(pool));
        self
    }

    pub fn build(self) -> Result<RetrievalAugmentor> {
        let query_router = self.query_router.ok_or_else(|| {
            RagError::Config("a query router or content retriever is required".to_string())
        })?;

        let content_injector: Arc<dyn ContentInjector> = match self.content_injector {
            Some(injector) => injector,
            None => Arc::new(DefaultContentInjector::new()?),
        };

        Ok(RetrievalAugmentor {
            query_transformer: self
                .query_transformer
                .unwrap_or_else(|| Arc::new(DefaultQueryTransformer::new())),
            query_router,
            content_aggregator: self
                .content_aggregator
                .unwrap_or_else(|| Arc::new(DefaultContentAggregator::new())),
            content_injector,
            worker_pool: self
                .worker_pool
                .unwrap_or_else(|| Arc::new(TokioWorkerPool::ambient())),
        })
    }

    /// Builder pre-populated from configuration
    ///
    /// `completer` is required by the compressing/expanding transformers and
    /// the language model router. `retrievers` carry the description shown
    /// to the language model router; the default router ignores it.
    pub fn from_config(
        config: &RagConfig,
        completer: Option<Arc<dyn TextCompleter>>,
        retrievers: Vec<(Arc<dyn ContentRetriever>, String)>,
    ) -> Result<Self> {
        config.validate()?;

        let require_completer = |component: &str| {
            completer.clone().ok_or_else(|| {
                RagError::Config(format!("{} needs a text completer", component))
            })
        };

        let transformer_config = &config.transformer;
        let query_transformer: Arc<dyn QueryTransformer> = match transformer_config.kind {
            TransformerKind::Passthrough => Arc::new(DefaultQueryTransformer::new()),
            TransformerKind::Compressing => Arc::new(CompressingQueryTransformer::with_template(
                require_completer("compressing transformer")?,
                transformer_config
                    .template
                    .as_deref()
                    .unwrap_or(DEFAULT_COMPRESSING_PROMPT),
            )?),
            TransformerKind::Expanding => Arc::new(ExpandingQueryTransformer::with_config(
                require_completer("expanding transformer")?,
                transformer_config
                    .template
                    .as_deref()
                    .unwrap_or(DEFAULT_EXPANDING_PROMPT),
                transformer_config.n,
            )?),
        };

        let query_router: Arc<dyn QueryRouter> = match config.router.kind {
            RouterKind::Default => Arc::new(DefaultQueryRouter::new(
                retrievers.into_iter().map(|(retriever, _)| retriever).collect(),
            )?),
            RouterKind::LanguageModel => {
                let mut router =
                    LanguageModelQueryRouter::new(require_completer("language model router")?, retrievers)?
                        .with_fallback(config.router.fallback);
                if let Some(template) = config.router.template.as_deref() {
                    router = router.with_template(template)?;
                }
                Arc::new(router)
            }
        };

        let aggregator_config = &config.aggregator;
        let content_aggregator: Arc<dyn ContentAggregator> = match aggregator_config.kind {
            AggregatorKind::Default => Arc::new(DefaultContentAggregator::new()),
            AggregatorKind::Rrf => Arc::new(ReciprocalRankFusionAggregator::with_k(aggregator_config.rrf_k)),
            AggregatorKind::Reranking => {
                let mut aggregator =
                    ReRankingContentAggregator::new(Arc::new(KeywordOverlapScorer::new()))
                        .with_rrf_k(aggregator_config.rrf_k);
                if let Some(min_score) = aggregator_config.min_score {
                    aggregator = aggregator.with_min_score(min_score);
                }
                if let Some(max_results) = aggregator_config.max_results {
                    aggregator = aggregator.with_max_results(max_results)?;
                }
                Arc::new(aggregator)
            }
        };

        let content_injector = DefaultContentInjector::with_config(
            config
                .injector
                .template
                .as_deref()
                .unwrap_or(DEFAULT_INJECTION_PROMPT),
            config.injector.metadata_keys.clone(),
        )?;

        let worker_pool = if config.pool.dedicated {
            TokioWorkerPool::dedicated(&config.pool)?
        } else {
            TokioWorkerPool::ambient()
        };

        Ok(Self {
            query_transformer: Some(query_transformer),
            query_router: Some(query_router),
            content_aggregator: Some(content_aggregator),
            content_injector: Some(Arc::new(content_injector)),
            worker_pool: Some(Arc::new(worker_pool)),
        })
    }
}
