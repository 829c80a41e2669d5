//! Prompt templates with `{{variable}}` placeholders
//!
//! Thin wrapper over a single-template Handlebars registry. Values are
//! inserted verbatim (no HTML escaping); unknown placeholders render empty.

use handlebars::{no_escape, Handlebars};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{RagError, Result};

const TEMPLATE_NAME: &str = "prompt";

/// Compiled prompt template
pub struct PromptTemplate {
    source: String,
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a template, failing on blank input or invalid syntax
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let source = template.into();
        if source.trim().is_empty() {
            return Err(RagError::Config("prompt template must not be blank".to_string()));
        }

        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry.set_strict_mode(false);
        registry.register_template_string(TEMPLATE_NAME, &source)?;

        Ok(Self { source, registry })
    }

    /// Render with the given variables
    pub fn render(&self, variables: &[(&str, &str)]) -> Result<String> {
        let data: BTreeMap<&str, &str> = variables.iter().copied().collect();
        Ok(self.registry.render(TEMPLATE_NAME, &data)?)
    }
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("source", &self.source)
            .finish()
    }
}
