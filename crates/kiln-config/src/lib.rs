//! Kiln Configuration System
//!
//! Provides configuration management for kiln projects including:
//! - Project manifests (project.json) with cumulative diagnostics
//! - Dependency coordinates into the shared package store
//! - Global user configuration (~/.kiln/config.toml)
//!
//! # Configuration Hierarchy
//!
//! Settings are resolved in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.kiln/config.toml)
//! 3. Environment variables (KILN_HOME)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ProjectManifest;
//! use std::path::Path;
//!
//! let manifest = ProjectManifest::load(Path::new(".")).unwrap();
//! for diagnostic in manifest.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

pub mod dependency;
pub mod global;
pub mod manifest;

mod field;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// File name of the project manifest
pub const MANIFEST_FILE_NAME: &str = "project.json";

// Re-export main types
pub use dependency::Dependency;
pub use global::{GlobalConfig, StoreConfig, ToolsConfig};
pub use manifest::{Descriptor, Diagnostic, JavaConfig, ProjectManifest, SourceSet, TestSet};
