//! Locations of the external Java tools
use crate::error::{BuildError, BuildResult};
use kiln_config::global::{DEFAULT_LEGACY_RUNTIME, DEFAULT_TEST_RUNNER};
use kiln_config::ToolsConfig;
use std::path::{Path, PathBuf};

/// Extension of source files
pub const SOURCE_EXTENSION: &str = "java";
/// Extension of compiled output files
pub const CLASS_EXTENSION: &str = "class";

/// Language levels that need the JDK 8 runtime on the boot classpath
const LEGACY_VERSIONS: [&str; 2] = ["8", "1.8"];

/// Tools used by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub javac: PathBuf,
    pub jar: PathBuf,
    pub java: PathBuf,
    pub jacoco_agent: Option<PathBuf>,
    pub jacoco_cli: Option<PathBuf>,
    /// Main class of the test harness
    pub test_runner: String,
    pub legacy_runtime: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            javac: PathBuf::from("javac"),
            jar: PathBuf::from("jar"),
            java: PathBuf::from("java"),
            jacoco_agent: None,
            jacoco_cli: None,
            test_runner: DEFAULT_TEST_RUNNER.to_string(),
            legacy_runtime: PathBuf::from(DEFAULT_LEGACY_RUNTIME),
        }
    }
}

impl Toolchain {
    /// Apply configured tool locations over the defaults
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let defaults = Self::default();
        Self {
            javac: tools.javac.clone().unwrap_or(defaults.javac),
            jar: tools.jar.clone().unwrap_or(defaults.jar),
            java: tools.java.clone().unwrap_or(defaults.java),
            jacoco_agent: tools.jacoco_agent.clone(),
            jacoco_cli: tools.jacoco_cli.clone(),
            test_runner: tools.test_runner.clone().unwrap_or(defaults.test_runner),
            legacy_runtime: tools.legacy_runtime.clone().unwrap_or(defaults.legacy_runtime),
        }
    }

    /// Boot classpath required for a language level, if any
    pub fn boot_classpath_for(&self, language_version: &str) -> Option<&Path> {
        LEGACY_VERSIONS
            .contains(&language_version)
            .then_some(self.legacy_runtime.as_path())
    }

    pub fn jacoco_agent(&self) -> BuildResult<&Path> {
        self.jacoco_agent
            .as_deref()
            .ok_or_else(|| BuildError::tool_not_configured("jacoco-agent"))
    }

    pub fn jacoco_cli(&self) -> BuildResult<&Path> {
        self.jacoco_cli
            .as_deref()
            .ok_or_else(|| BuildError::tool_not_configured("jacoco-cli"))
    }
}
