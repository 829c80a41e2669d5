//! Stub collaborators shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::completion::TextCompleter;
use crate::errors::{RagError, Result};
use crate::rag::retrieval::ContentRetriever;
use crate::types::{Content, Query};

/// Completer returning a canned response and recording prompts
pub struct ScriptedCompleter {
    response: std::result::Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    pub fn replying(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextCompleter for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().map_err(RagError::Completion)
    }
}

/// Retriever returning fixed content
pub struct StaticRetriever {
    name: String,
    contents: Vec<Content>,
}

impl StaticRetriever {
    pub fn shared(name: &str, texts: &[&str]) -> Arc<dyn ContentRetriever> {
        Arc::new(Self {
            name: name.to_string(),
            contents: texts.iter().map(|t| Content::new(*t)).collect(),
        })
    }
}

#[async_trait]
impl ContentRetriever for StaticRetriever {
    async fn retrieve(&self, _query: &Query) -> Result<Vec<Content>> {
        Ok(self.contents.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Names of the given retrievers, in order
pub fn names(retrievers: &[Arc<dyn ContentRetriever>]) -> Vec<String> {
    retrievers.iter().map(|r| r.name().to_string()).collect()
}
