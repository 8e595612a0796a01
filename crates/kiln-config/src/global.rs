//! Global Configuration (~/.kiln/config.toml)
//!
//! Handles user-level configuration: where the shared package store lives
//! and which external tools the pipeline invokes.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the package store root
pub const STORE_ROOT_ENV: &str = "KILN_HOME";

/// JDK 8 runtime used as the boot classpath when compiling for Java 8
pub const DEFAULT_LEGACY_RUNTIME: &str = "/usr/lib/jvm/java-8-openjdk/jre/lib/rt.jar";

/// Main class of the default test harness
pub const DEFAULT_TEST_RUNNER: &str = "kiln.ConsoleTestRunner";

/// Global user configuration from ~/.kiln/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Package store settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// External tool locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
}

/// Package store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root folder of the shared package store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// External tool locations; unset entries fall back to names on PATH
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javac: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jar: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub java: Option<PathBuf>,

    /// JaCoCo agent jar (`jacocoagent.jar`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jacoco_agent: Option<PathBuf>,

    /// JaCoCo command line jar (`jacococli.jar`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jacoco_cli: Option<PathBuf>,

    /// Main class of the test harness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_runner: Option<String>,

    /// Runtime jar passed as `-bootclasspath` for Java 8 builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_runtime: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::from_toml_str(&content, path)
    }

    /// Load the user's global configuration, or defaults when there is none
    pub fn load() -> ConfigResult<Self> {
        let path = Self::global_config_path()?;
        match Self::load_from_file(&path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => {
                tracing::debug!(path = %path.display(), "no global configuration");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    fn from_toml_str(content: &str, path: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(root) = self.store.as_ref().and_then(|s| s.root.as_ref()) {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "store.root".to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
        }

        if let Some(runner) = self.tools.as_ref().and_then(|t| t.test_runner.as_ref()) {
            if runner.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "tools.test-runner".to_string(),
                    reason: "class name cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.kiln/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        Ok(kiln_home()?.join("config.toml"))
    }

    /// Package store root
    ///
    /// Precedence: `KILN_HOME`, then `store.root`, then `~/.kiln/store`.
    pub fn store_root(&self) -> ConfigResult<PathBuf> {
        if let Some(root) = std::env::var_os(STORE_ROOT_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(root));
        }
        if let Some(root) = self.store.as_ref().and_then(|s| s.root.clone()) {
            return Ok(root);
        }
        Ok(kiln_home()?.join("store"))
    }

    /// Tool settings, defaulted when the section is absent
    pub fn tools(&self) -> ToolsConfig {
        self.tools.clone().unwrap_or_default()
    }
}

fn kiln_home() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".kiln"))
}
