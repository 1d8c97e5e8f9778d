//! Shared types, error model, and configuration for apidoc.
//!
//! This crate is the foundation depended on by all other apidoc crates.
//! It provides:
//! - [`ApiDocError`]: the unified error type
//! - Output manifest types ([`OutputManifest`], [`DocumentRecord`])
//! - Configuration ([`AppConfig`], [`RenderConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FiltersConfig, RenderConfig, RenderSection, SourceEntry,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ApiDocError, Result};
pub use types::{CURRENT_SCHEMA_VERSION, DocumentRecord, OutputManifest};
