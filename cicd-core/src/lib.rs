//! Shared domain types, provider configuration and local state.
//!
//! - [`types`]: newtypes, [`PipelineKind`], [`PipelineHandle`], storage keys
//! - [`config`]: [`ProviderConfig`] load / validate
//! - [`state`]: caller-owned records for charts and pipelines
//! - [`error`]: [`ConfigError`], [`StateError`]

pub mod config;
pub mod error;
pub mod state;
pub mod types;

pub use config::ProviderConfig;
pub use error::{ConfigError, StateError};
pub use types::{
    storage_key, BundleId, ChartName, ContentHash, PipelineHandle, PipelineId, PipelineKind,
    PipelineSecret, DEFAULT_CATEGORY, HASH_META_KEY,
};
