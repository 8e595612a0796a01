//! Dependency coordinates
//!
//! A dependency names a prebuilt artifact in the package store by
//! `(publisher, project, version)`. The version is an exact folder name.

use std::fmt;
use std::path::{Path, PathBuf};

/// Extension of archived artifacts in the package store
pub const ARTIFACT_EXTENSION: &str = "jar";

/// A `(publisher, project, version)` coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    publisher: String,
    project: String,
    version: String,
}

impl Dependency {
    /// Create a new dependency coordinate
    pub fn new(
        publisher: impl Into<String>,
        project: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            project: project.into(),
            version: version.into(),
        }
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Artifact file name, e.g. `project.jar`
    pub fn artifact_file_name(&self) -> String {
        format!("{}.{}", self.project, ARTIFACT_EXTENSION)
    }

    /// Folder that holds this dependency's artifact, relative to the store root
    pub fn relative_folder(&self) -> PathBuf {
        PathBuf::from(&self.publisher)
            .join(&self.project)
            .join(&self.version)
    }

    /// `publisher/project/version/project.jar`
    pub fn relative_path(&self) -> PathBuf {
        self.relative_folder().join(self.artifact_file_name())
    }

    /// Absolute artifact path under the given package store root
    pub fn artifact_path(&self, store_root: &Path) -> PathBuf {
        store_root.join(self.relative_path())
    }
}

impl fmt::Display for Dependency {
    /// Always uses `/`, independent of the platform separator
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.publisher,
            self.project,
            self.version,
            self.artifact_file_name()
        )
    }
}
