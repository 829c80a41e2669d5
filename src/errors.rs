//! Error types for ragbuddy
//!
//! One variant per failure domain of the augmentation pipeline. Routing
//! failures are the only ones a component may absorb (see
//! [`FallbackStrategy`](crate::rag::router::FallbackStrategy)); everything
//! else propagates out of `augment()` unchanged.

use thiserror::Error;

/// Main error type for the augmentation pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// The request cannot be augmented (e.g. not a user message)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A content retriever failed
    #[error("Retrieval failed in {retriever}: {message}")]
    Retrieval { retriever: String, message: String },

    /// The router could not make sense of a routing decision
    #[error("Routing error: {0}")]
    Routing(String),

    /// The text-completion collaborator failed
    #[error("Completion error: {0}")]
    Completion(String),

    /// Prompt template compile or render errors
    #[error("Template error: {0}")]
    Template(String),

    /// Invalid construction parameters or configuration file
    #[error("Configuration error: {0}")]
    Config(String),

    /// A task submitted to the worker pool never reported back
    #[error("Dispatched task aborted: {0}")]
    TaskAborted(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl RagError {
    /// Build a retrieval error for the named retriever
    pub fn retrieval(retriever: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::Retrieval {
            retriever: retriever.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        RagError::Generic(format!("{:#}", err))
    }
}

impl From<handlebars::TemplateError> for RagError {
    fn from(err: handlebars::TemplateError) -> Self {
        RagError::Template(err.to_string())
    }
}

impl From<handlebars::RenderError> for RagError {
    fn from(err: handlebars::RenderError) -> Self {
        RagError::Template(err.to_string())
    }
}
