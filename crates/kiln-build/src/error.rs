/// Build system error types
use kiln_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Failed to start '{program}': {error}")]
    ToolSpawn {
        program: String,
        error: std::io::Error,
    },

    #[error("Tool '{tool}' is not configured: {hint}")]
    ToolNotConfigured { tool: String, hint: String },

    #[error("Invalid coverage report at {path}: {error}")]
    CoverageReport { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a spawn error for an external tool
    pub fn tool_spawn(program: impl Into<String>, error: std::io::Error) -> Self {
        Self::ToolSpawn {
            program: program.into(),
            error,
        }
    }

    /// Create a coverage report error
    pub fn coverage_report(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::CoverageReport {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create an error for a required tool that has no configured location
    pub fn tool_not_configured(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let hint = format!("set tools.{} in ~/.kiln/config.toml", tool);
        Self::ToolNotConfigured { tool, hint }
    }
}
