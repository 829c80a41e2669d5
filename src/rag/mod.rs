// Retrieval-augmented generation pipeline
//
// Augments a user message with external knowledge before it reaches the
// model.
//
// Components:
// - Transformer: rewrite/expand/compress the query
// - Router: pick retrievers per query
// - Retrieval: opaque content sources
// - Aggregator: merge everything retrieved into one list
// - Injector: render the list into the outgoing message
// - Augmentor: end-to-end orchestration over a worker pool

pub mod transformer;
pub mod router;
pub mod retrieval;
pub mod aggregator;
pub mod injector;
pub mod pool;
pub mod augmentor;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types
pub use transformer::{
    CompressingQueryTransformer, DefaultQueryTransformer, ExpandingQueryTransformer,
    QueryTransformer,
};
pub use router::{DefaultQueryRouter, FallbackStrategy, LanguageModelQueryRouter, QueryRouter};
pub use retrieval::ContentRetriever;
pub use aggregator::{
    ContentAggregator, ContentScorer, DefaultContentAggregator, KeywordOverlapScorer,
    ReRankingContentAggregator, ReciprocalRankFusionAggregator,
};
pub use injector::{ContentInjector, DefaultContentInjector};
pub use pool::{TokioWorkerPool, WorkerPool};
pub use augmentor::{RetrievalAugmentor, RetrievalAugmentorBuilder};
