//! Retrieved content

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One unit of retrieved text and its provenance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    text: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Content {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::new(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::new(text)
    }
}
