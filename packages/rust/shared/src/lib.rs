//! Shared types, error model, and configuration for CoSuJu.
//!
//! This crate is the foundation depended on by all other CoSuJu crates.
//! It provides:
//! - [`CosujuError`]: the unified error type
//! - Record types ([`Document`], [`DecisionRecord`], [`ScrapeOutput`], [`DatasetRecord`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ArchiveConfig, DEFAULT_ARCHIVE_URL, DEFAULT_USER_AGENT, HttpConfig, OutputConfig,
    RunConfig, ScrapeConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, parse_base_url,
};
pub use error::{CosujuError, Result};
pub use types::{DatasetRecord, DecisionRecord, Document, DocumentKind, ScrapeOutput, record_id};
