//! Executor configuration.
//!
//! Hierarchical loading, same layering as the rest of the ecosystem:
//! 1. `config.toml` (base configuration)
//! 2. `config.local.toml` (git-ignored local overrides)
//! 3. Environment variables (`RELQUERY_` prefix, `__` nesting separator)
//!
//! ```toml
//! # config.toml
//! [executor]
//! enable_symmetric_hash_join = true
//! max_subquery_workers = 0
//! ```
//!
//! ```bash
//! RELQUERY_EXECUTOR__MAX_SUBQUERY_WORKERS=8
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Every executor feature flag and tunable, grouped under one struct
/// since the phase executor threads them through as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    /// Master switch. When false, callers should fall back to whatever
    /// legacy execution path exists outside this crate.
    pub use_query_executor: bool,

    /// Allow operators to be expressed as composed [`TupleIterator`](crate::relation::TupleIterator)
    /// wrappers rather than always materializing between stages.
    pub enable_iterator_composition: bool,

    /// Streaming relations are single-use (a second `iterator()` call is a
    /// contract violation) rather than auto-materializing on first read.
    pub enable_true_streaming: bool,

    /// Allow [`join::select_strategy`](crate::join::select_strategy) to pick
    /// the symmetric hash join when both join inputs are streaming.
    pub enable_symmetric_hash_join: bool,

    /// Run independent subquery combinations across the worker pool instead
    /// of sequentially.
    pub enable_parallel_subqueries: bool,

    /// Worker count for [`subquery::execute_parallel`](crate::subquery::execute_parallel).
    /// 0 means one worker per available hardware thread.
    pub max_subquery_workers: usize,

    /// Minimum number of outer combinations before the parallel strategy is
    /// considered over the sequential one.
    pub parallel_subquery_threshold: usize,

    /// Group correlated subqueries sharing a signature into one batched
    /// evaluation.
    pub enable_subquery_decorrelation: bool,

    /// Combine per-combination batched subquery results via a streaming
    /// union rather than materializing every sub-result before combining.
    pub use_streaming_subquery_union: bool,

    /// Route batchable subqueries through [`subquery::build_batch_relation`](crate::subquery::build_batch_relation)
    /// plus a single relation-accepting inner query, instead of one inner
    /// query invocation per outer combination.
    pub use_componentized_subquery: bool,

    /// Allow [`join::join`](crate::join::join) to consider streaming
    /// strategies at all; when false every join forces both sides
    /// materialized first.
    pub enable_streaming_joins: bool,

    /// Initial bucket count for a join's build-side hash table.
    pub default_hash_table_size: usize,

    /// Allow [`aggregation::aggregate`](crate::aggregation::aggregate) to
    /// consume a streaming input rather than requiring a materialized one.
    pub enable_streaming_aggregation: bool,

    /// Emit `tracing::debug!` spans around streaming aggregation groups.
    pub enable_streaming_aggregation_debug: bool,

    /// Emit `tracing::debug!` spans around phase execution generally.
    pub enable_debug_logging: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            use_query_executor: true,
            enable_iterator_composition: true,
            enable_true_streaming: false,
            enable_symmetric_hash_join: true,
            enable_parallel_subqueries: true,
            max_subquery_workers: 0,
            parallel_subquery_threshold: 100,
            enable_subquery_decorrelation: true,
            use_streaming_subquery_union: false,
            use_componentized_subquery: true,
            enable_streaming_joins: true,
            default_hash_table_size: 256,
            enable_streaming_aggregation: false,
            enable_streaming_aggregation_debug: false,
            enable_debug_logging: false,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string, e.g. `"info"` or
    /// `"relquery=debug,warn"`.
    pub filter: String,
    /// `"text"` or `"json"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            executor: ExecutorOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations, layering environment
    /// overrides on top of any config files found.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("RELQUERY_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RELQUERY_").split("__"))
            .extract()
    }
}
