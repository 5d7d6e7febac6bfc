//! Shared types, error model, and configuration for bookmarkprep.
//!
//! This crate is the foundation depended on by all other bookmarkprep crates.
//! It provides:
//! - [`BookmarkPrepError`]: the unified error type
//! - Domain types ([`RawBookmark`], [`CanonicalBookmark`], [`MediaType`])
//! - Configuration ([`AppConfig`], [`BatchingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchingConfig, PathsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{BookmarkPrepError, Result};
pub use types::{CANONICAL_FIELDS, CanonicalBookmark, MediaType, RawBookmark, RawMedia};
