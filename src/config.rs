//! Configuration file support
//!
//! `~/.ragbuddy/config.toml` selects the strategy variants and their
//! parameters. Every section is optional; a missing file is created with
//! defaults on first load.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};
use crate::rag::router::FallbackStrategy;

/// Default idle time before a pool thread is reclaimed
pub const DEFAULT_KEEP_ALIVE_MS: u64 = 1_000;

/// Default number of alternate phrasings for query expansion
pub const DEFAULT_EXPANSION_COUNT: usize = 3;

/// Default smoothing constant for reciprocal rank fusion
pub const DEFAULT_RRF_K: u32 = 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub pool: PoolConfig,
    pub transformer: TransformerConfig,
    pub router: RouterConfig,
    pub aggregator: AggregatorConfig,
    pub injector: InjectorConfig,
}

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Run dispatched work on an owned runtime instead of the caller's
    pub dedicated: bool,
    /// Async workers driving I/O and timers of a dedicated pool
    /// (None = number of CPUs)
    pub worker_threads: Option<usize>,
    /// Idle time before a dedicated pool's task threads exit
    pub keep_alive_ms: u64,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            dedicated: false,
            worker_threads: None,
            keep_alive_ms: DEFAULT_KEEP_ALIVE_MS,
            thread_name: "ragbuddy-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(RagError::Config("pool.worker_threads must be > 0".to_string()));
        }
        if self.thread_name.trim().is_empty() {
            return Err(RagError::Config("pool.thread_name must not be blank".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    #[default]
    Passthrough,
    Compressing,
    Expanding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    pub kind: TransformerKind,
    /// Number of phrasings requested by the expanding transformer
    pub n: usize,
    /// Custom prompt template (None = built-in prompt)
    pub template: Option<String>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            kind: TransformerKind::Passthrough,
            n: DEFAULT_EXPANSION_COUNT,
            template: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    /// Every query goes to every retriever
    #[default]
    Default,
    /// Ask the model which retrievers fit the query
    LanguageModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub kind: RouterKind,
    pub fallback: FallbackStrategy,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorKind {
    #[default]
    Default,
    Rrf,
    Reranking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub kind: AggregatorKind,
    pub rrf_k: u32,
    /// Re-ranking: drop content scoring below this
    pub min_score: Option<f64>,
    /// Re-ranking: keep at most this many
    pub max_results: Option<usize>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            kind: AggregatorKind::Default,
            rrf_k: DEFAULT_RRF_K,
            min_score: None,
            max_results: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Content metadata keys rendered next to each content
    pub metadata_keys: Vec<String>,
    pub template: Option<String>,
}

impl RagConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = RagConfig::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RagConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".ragbuddy").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        self.pool.validate()?;

        if self.transformer.n == 0 {
            return Err(RagError::Config("transformer.n must be > 0".to_string()));
        }
        if self.aggregator.max_results == Some(0) {
            return Err(RagError::Config("aggregator.max_results must be > 0".to_string()));
        }
        if self.injector.metadata_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(RagError::Config(
                "injector.metadata_keys must not contain blank keys".to_string(),
            ));
        }

        Ok(())
    }
}
