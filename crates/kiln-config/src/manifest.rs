//! Project Manifest (project.json)
//!
//! Parses the project manifest in a single pass into an immutable
//! [`Descriptor`] plus a list of [`Diagnostic`]s. Parsing never fails on
//! malformed input: every problem is reported and the affected value is left
//! unset, while unrelated properties keep parsing.

use crate::dependency::Dependency;
use crate::field::{self, Field, ObjectReader};
use crate::{ConfigError, ConfigResult, MANIFEST_FILE_NAME};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default folder for main sources, relative to the project directory
pub const DEFAULT_SOURCES_FOLDER: &str = "sources";
/// Default folder for test sources
pub const DEFAULT_TESTS_FOLDER: &str = "tests";
/// Default folder for build outputs
pub const DEFAULT_OUTPUTS_FOLDER: &str = "outputs";

/// A problem found while reading the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Manifest file the problem was found in
    pub file: PathBuf,
    /// Dotted property path (empty for the document root)
    pub property: String,
    /// What is wrong
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property.is_empty() {
            write!(f, "{}: {}", self.file.display(), self.message)
        } else {
            write!(
                f,
                "{}: '{}' {}",
                self.file.display(),
                self.property,
                self.message
            )
        }
    }
}

/// A source folder plus its language level
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSet {
    pub folder: String,
    pub version: Option<String>,
}

/// Test folder, language level and optional coverage gate
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    pub folder: String,
    pub version: Option<String>,
    pub minimum_line_coverage_percent: Option<f64>,
}

/// The `java` section of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct JavaConfig {
    pub main_class: Option<String>,
    pub sources: Option<SourceSet>,
    pub tests: Option<TestSet>,
    pub outputs: Option<String>,
    pub classpath: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub shortcut_name: Option<String>,
}

/// Validated project configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub publisher: Option<String>,
    pub project: Option<String>,
    pub version: Option<String>,
    pub java: Option<JavaConfig>,
}

impl Descriptor {
    pub fn main_class(&self) -> Option<&str> {
        self.java.as_ref().and_then(|j| j.main_class.as_deref())
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.java
            .as_ref()
            .map(|j| j.dependencies.as_slice())
            .unwrap_or(&[])
    }

    pub fn classpath_entries(&self) -> &[String] {
        self.java
            .as_ref()
            .map(|j| j.classpath.as_slice())
            .unwrap_or(&[])
    }

    /// Launcher script name: `shortcutName`, falling back to the project name
    pub fn shortcut_name(&self) -> Option<&str> {
        self.java
            .as_ref()
            .and_then(|j| j.shortcut_name.as_deref())
            .or(self.project.as_deref())
    }
}

/// A loaded manifest: raw text, descriptor and diagnostics
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    path: PathBuf,
    raw: String,
    descriptor: Descriptor,
    diagnostics: Vec<Diagnostic>,
}

impl ProjectManifest {
    /// Read `project.json` from a project directory
    pub fn load(project_dir: &Path) -> ConfigResult<Self> {
        let path = project_dir.join(MANIFEST_FILE_NAME);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.clone())
            } else {
                ConfigError::IoError(e)
            }
        })?;
        Ok(Self::parse(raw, path))
    }

    /// Parse manifest text; `path` is only used to label diagnostics
    pub fn parse(raw: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let raw = raw.into();
        let path = path.into();
        let mut parser = ManifestParser {
            file: &path,
            diagnostics: Vec::new(),
        };

        let descriptor = match serde_json::from_str::<Value>(&raw) {
            Ok(document) => parser.parse_document(&document),
            Err(e) => {
                parser.report("", format!("is not valid JSON: {}", e));
                Descriptor::default()
            }
        };
        let diagnostics = parser.diagnostics;

        for diagnostic in &diagnostics {
            tracing::debug!(%diagnostic, "manifest diagnostic");
        }

        Self {
            path,
            raw,
            descriptor,
            diagnostics,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manifest text exactly as read
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

struct ManifestParser<'p> {
    file: &'p Path,
    diagnostics: Vec<Diagnostic>,
}

impl ManifestParser<'_> {
    fn report(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            file: self.file.to_path_buf(),
            property: property.into(),
            message: message.into(),
        });
    }

    fn parse_document(&mut self, document: &Value) -> Descriptor {
        let root = match ObjectReader::root(document) {
            Field::Present(root) => root,
            Field::Malformed(reason) => {
                self.report("", format!("root {}", reason));
                return Descriptor::default();
            }
            Field::Absent => return Descriptor::default(),
        };

        let publisher = self.required_string(&root, "publisher");
        let project = self.required_string(&root, "project");
        let version = self.required_string(&root, "version");
        let java = self.java_section(&root);

        Descriptor {
            publisher,
            project,
            version,
            java,
        }
    }

    /// Missing, malformed and empty values are each reported once and yield `None`
    fn required_string(&mut self, object: &ObjectReader<'_>, name: &str) -> Option<String> {
        let property = object.property_path(name);
        match object.string(name) {
            Field::Present(value) if value.is_empty() => {
                self.report(property, "cannot be empty");
                None
            }
            Field::Present(value) => Some(value),
            Field::Absent => {
                self.report(property, "is missing");
                None
            }
            Field::Malformed(reason) => {
                self.report(property, reason);
                None
            }
        }
    }

    /// Absent is fine; malformed and empty values are reported
    fn optional_string(&mut self, object: &ObjectReader<'_>, name: &str) -> Option<String> {
        let property = object.property_path(name);
        match object.string(name) {
            Field::Present(value) if value.is_empty() => {
                self.report(property, "cannot be empty");
                None
            }
            Field::Present(value) => Some(value),
            Field::Absent => None,
            Field::Malformed(reason) => {
                self.report(property, reason);
                None
            }
        }
    }

    fn java_section(&mut self, root: &ObjectReader<'_>) -> Option<JavaConfig> {
        let java = match root.object("java") {
            Field::Present(java) => java,
            Field::Absent => {
                self.report("java", "section is missing");
                return None;
            }
            Field::Malformed(reason) => {
                self.report("java", reason);
                return None;
            }
        };

        let main_class = self.optional_string(&java, "mainClass");
        let sources = self.source_set(&java, "sources", DEFAULT_SOURCES_FOLDER);
        let tests = self.test_set(&java);
        let outputs = self.folder(&java, "outputs", DEFAULT_OUTPUTS_FOLDER);
        let classpath = self.classpath(&java);
        let dependencies = self.dependencies(&java);
        let shortcut_name = self.optional_string(&java, "shortcutName");

        Some(JavaConfig {
            main_class,
            sources,
            tests,
            outputs,
            classpath,
            dependencies,
            shortcut_name,
        })
    }

    fn folder(&mut self, object: &ObjectReader<'_>, name: &str, default: &str) -> Option<String> {
        match object.string(name) {
            Field::Absent => Some(default.to_string()),
            _ => self.optional_string(object, name),
        }
    }

    fn source_set(
        &mut self,
        java: &ObjectReader<'_>,
        name: &str,
        default_folder: &str,
    ) -> Option<SourceSet> {
        match java.value(name) {
            None => Some(SourceSet {
                folder: default_folder.to_string(),
                version: None,
            }),
            Some(Value::String(_)) => self.optional_string(java, name).map(|folder| SourceSet {
                folder,
                version: None,
            }),
            Some(_) => {
                let set = self.set_object(java, name)?;
                let folder = self.folder(&set, "folder", default_folder)?;
                let version = self.optional_string(&set, "version");
                Some(SourceSet { folder, version })
            }
        }
    }

    fn test_set(&mut self, java: &ObjectReader<'_>) -> Option<TestSet> {
        let sources = self.source_set(java, "tests", DEFAULT_TESTS_FOLDER)?;
        let minimum_line_coverage_percent = match java.object("tests") {
            Field::Present(tests) => self.coverage_threshold(&tests),
            _ => None,
        };
        Some(TestSet {
            folder: sources.folder,
            version: sources.version,
            minimum_line_coverage_percent,
        })
    }

    fn set_object<'a>(&mut self, java: &ObjectReader<'a>, name: &str) -> Option<ObjectReader<'a>> {
        match java.object(name) {
            Field::Present(set) => Some(set),
            Field::Absent => None,
            Field::Malformed(_) => {
                let found = java.value(name).map(field::kind).unwrap_or("nothing");
                self.report(
                    java.property_path(name),
                    format!("expected a string or an object, found {}", found),
                );
                None
            }
        }
    }

    fn coverage_threshold(&mut self, tests: &ObjectReader<'_>) -> Option<f64> {
        let name = "minimumLineCoveragePercent";
        match tests.number(name) {
            Field::Present(percent) if (0.0..=100.0).contains(&percent) => Some(percent),
            Field::Present(percent) => {
                self.report(
                    tests.property_path(name),
                    format!("must be between 0 and 100, found {}", percent),
                );
                None
            }
            Field::Absent => None,
            Field::Malformed(reason) => {
                self.report(tests.property_path(name), reason);
                None
            }
        }
    }

    fn classpath(&mut self, java: &ObjectReader<'_>) -> Vec<String> {
        let property = java.property_path("classpath");
        match java.value("classpath") {
            None => Vec::new(),
            Some(Value::String(entry)) => vec![entry.clone()],
            Some(Value::Array(items)) => {
                let mut entries = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match field::as_string(item) {
                        Field::Present(entry) => entries.push(entry),
                        Field::Malformed(reason) => {
                            self.report(format!("{}[{}]", property, index), reason)
                        }
                        Field::Absent => {}
                    }
                }
                entries
            }
            Some(other) => {
                self.report(
                    property,
                    format!(
                        "expected a string or an array of strings, found {}",
                        field::kind(other)
                    ),
                );
                Vec::new()
            }
        }
    }

    fn dependencies(&mut self, java: &ObjectReader<'_>) -> Vec<Dependency> {
        let property = java.property_path("dependencies");
        let items = match java.array("dependencies") {
            Field::Present(items) => items,
            Field::Absent => return Vec::new(),
            Field::Malformed(reason) => {
                self.report(property, reason);
                return Vec::new();
            }
        };

        let mut dependencies = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let entry = match field::nested(item, format!("{}[{}]", property, index)) {
                Field::Present(entry) => entry,
                Field::Malformed(reason) => {
                    self.report(format!("{}[{}]", property, index), reason);
                    continue;
                }
                Field::Absent => continue,
            };

            // Every field is checked so each problem gets its own diagnostic
            let publisher = self.required_string(&entry, "publisher");
            let project = self.required_string(&entry, "project");
            let version = self.required_string(&entry, "version");

            if let (Some(publisher), Some(project), Some(version)) = (publisher, project, version)
            {
                dependencies.push(Dependency::new(publisher, project, version));
            }
        }
        dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ProjectManifest {
        ProjectManifest::parse(text, "project.json")
    }

    fn properties(manifest: &ProjectManifest) -> Vec<&str> {
        manifest
            .diagnostics()
            .iter()
            .map(|d| d.property.as_str())
            .collect()
    }

    #[test]
    fn test_minimal_manifest_defaults() {
        let manifest = parse(r#"{"publisher":"a","project":"b","version":"c","java":{}}"#);
        assert!(!manifest.has_diagnostics());

        let java = manifest.descriptor().java.clone().unwrap();
        assert_eq!(java.sources.unwrap().folder, "sources");
        assert_eq!(java.tests.unwrap().folder, "tests");
        assert_eq!(java.outputs.as_deref(), Some("outputs"));
        assert!(java.classpath.is_empty());
        assert!(java.dependencies.is_empty());
    }

    #[test]
    fn test_root_not_object() {
        let manifest = parse("[]");
        assert_eq!(manifest.diagnostics().len(), 1);
        assert_eq!(manifest.descriptor(), &Descriptor::default());
    }

    #[test]
    fn test_invalid_json_is_a_diagnostic() {
        let manifest = parse("{ not json");
        assert_eq!(manifest.diagnostics().len(), 1);
        assert!(manifest.diagnostics()[0].message.contains("not valid JSON"));
    }

    #[test]
    fn test_missing_java_section_synthesizes_nothing() {
        let manifest = parse(r#"{"publisher":"a","project":"b","version":"c"}"#);
        assert_eq!(properties(&manifest), vec!["java"]);
        assert!(manifest.descriptor().java.is_none());
    }

    #[test]
    fn test_string_shorthand_for_sources() {
        let manifest = parse(
            r#"{"publisher":"a","project":"b","version":"c",
                "java":{"sources":"src","tests":"test"}}"#,
        );
        let java = manifest.descriptor().java.clone().unwrap();
        assert_eq!(
            java.sources,
            Some(SourceSet {
                folder: "src".to_string(),
                version: None
            })
        );
        assert_eq!(java.tests.unwrap().folder, "test");
    }

    #[test]
    fn test_malformed_coverage_threshold_only_drops_threshold() {
        let manifest = parse(
            r#"{"publisher":"a","project":"b","version":"c",
                "java":{"tests":{"folder":"t","minimumLineCoveragePercent":"high"}}}"#,
        );
        assert_eq!(
            properties(&manifest),
            vec!["java.tests.minimumLineCoveragePercent"]
        );
        let tests = manifest.descriptor().java.clone().unwrap().tests.unwrap();
        assert_eq!(tests.folder, "t");
        assert_eq!(tests.minimum_line_coverage_percent, None);
    }

    #[test]
    fn test_shortcut_name_falls_back_to_project() {
        let manifest = parse(r#"{"publisher":"a","project":"b","version":"c","java":{}}"#);
        assert_eq!(manifest.descriptor().shortcut_name(), Some("b"));

        let manifest = parse(
            r#"{"publisher":"a","project":"b","version":"c","java":{"shortcutName":"run-b"}}"#,
        );
        assert_eq!(manifest.descriptor().shortcut_name(), Some("run-b"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            file: PathBuf::from("project.json"),
            property: "publisher".to_string(),
            message: "is missing".to_string(),
        };
        assert_eq!(diagnostic.to_string(), "project.json: 'publisher' is missing");
    }
}
