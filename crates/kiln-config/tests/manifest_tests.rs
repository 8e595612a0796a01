//! Project manifest tests

use kiln_config::{ConfigError, Dependency, ProjectManifest};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_manifest_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let manifest_path = dir.join("project.json");
    fs::write(&manifest_path, content).unwrap();
    manifest_path
}

fn parse(content: &str) -> ProjectManifest {
    ProjectManifest::parse(content, "project.json")
}

fn diagnostic_properties(manifest: &ProjectManifest) -> Vec<String> {
    manifest
        .diagnostics()
        .iter()
        .map(|d| d.property.clone())
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_from_project_dir() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"{
    "publisher": "acme",
    "project": "widgets",
    "version": "7",
    "java": { "mainClass": "acme.widgets.Main" }
}"#;
    let manifest_path = create_manifest_file(temp_dir.path(), content);

    let manifest = ProjectManifest::load(temp_dir.path()).unwrap();

    assert!(!manifest.has_diagnostics());
    assert_eq!(manifest.path(), manifest_path.as_path());
    assert_eq!(manifest.raw(), content);
    assert_eq!(manifest.descriptor().publisher.as_deref(), Some("acme"));
    assert_eq!(manifest.descriptor().project.as_deref(), Some("widgets"));
    assert_eq!(manifest.descriptor().version.as_deref(), Some("7"));
    assert_eq!(manifest.descriptor().main_class(), Some("acme.widgets.Main"));
}

#[test]
fn test_load_missing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let result = ProjectManifest::load(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

// ============================================================================
// Required properties
// ============================================================================

#[rstest]
#[case(r#"{"project":"b","version":"c","java":{}}"#, "publisher")]
#[case(r#"{"publisher":"a","version":"c","java":{}}"#, "project")]
#[case(r#"{"publisher":"a","project":"b","java":{}}"#, "version")]
fn test_missing_required_field(#[case] content: &str, #[case] property: &str) {
    let manifest = parse(content);

    assert_eq!(diagnostic_properties(&manifest), vec![property.to_string()]);
    assert!(manifest.diagnostics()[0].message.contains("missing"));

    let descriptor = manifest.descriptor();
    let value = match property {
        "publisher" => &descriptor.publisher,
        "project" => &descriptor.project,
        _ => &descriptor.version,
    };
    assert_eq!(value, &None);
}

#[test]
fn test_all_required_fields_missing() {
    let manifest = parse(r#"{"java":{}}"#);
    assert_eq!(
        diagnostic_properties(&manifest),
        vec!["publisher", "project", "version"]
    );
}

#[test]
fn test_empty_required_field_is_unset() {
    let manifest = parse(r#"{"publisher":"","project":"b","version":"c","java":{}}"#);

    assert_eq!(diagnostic_properties(&manifest), vec!["publisher"]);
    assert_eq!(manifest.diagnostics()[0].message, "cannot be empty");
    assert_eq!(manifest.descriptor().publisher, None);
}

#[test]
fn test_wrong_type_reports_once_and_keeps_parsing_siblings() {
    let manifest = parse(
        r#"{"publisher":5,"project":"b","version":"c",
            "java":{"outputs":false,"classpath":"lib/x.jar"}}"#,
    );

    assert_eq!(
        diagnostic_properties(&manifest),
        vec!["publisher", "java.outputs"]
    );
    let descriptor = manifest.descriptor();
    assert_eq!(descriptor.publisher, None);
    assert_eq!(descriptor.project.as_deref(), Some("b"));

    let java = descriptor.java.as_ref().unwrap();
    assert_eq!(java.outputs, None);
    assert_eq!(java.classpath, vec!["lib/x.jar".to_string()]);
}

// ============================================================================
// java section
// ============================================================================

#[test]
fn test_java_section_not_an_object() {
    let manifest = parse(r#"{"publisher":"a","project":"b","version":"c","java":"8"}"#);

    assert_eq!(diagnostic_properties(&manifest), vec!["java"]);
    assert!(manifest.descriptor().java.is_none());
}

#[test]
fn test_sources_and_tests_objects() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{
                "sources":{"folder":"src","version":"11"},
                "tests":{"version":"17","minimumLineCoveragePercent":85}
            }}"#,
    );

    assert!(!manifest.has_diagnostics());
    let java = manifest.descriptor().java.as_ref().unwrap();

    let sources = java.sources.as_ref().unwrap();
    assert_eq!(sources.folder, "src");
    assert_eq!(sources.version.as_deref(), Some("11"));

    let tests = java.tests.as_ref().unwrap();
    assert_eq!(tests.folder, "tests");
    assert_eq!(tests.version.as_deref(), Some("17"));
    assert_eq!(tests.minimum_line_coverage_percent, Some(85.0));
}

#[test]
fn test_sources_wrong_type() {
    let manifest = parse(r#"{"publisher":"a","project":"b","version":"c","java":{"sources":3}}"#);

    assert_eq!(diagnostic_properties(&manifest), vec!["java.sources"]);
    let java = manifest.descriptor().java.as_ref().unwrap();
    assert!(java.sources.is_none());
    assert_eq!(java.tests.as_ref().unwrap().folder, "tests");
}

#[test]
fn test_coverage_threshold_out_of_range() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{"tests":{"minimumLineCoveragePercent":140}}}"#,
    );

    assert_eq!(
        diagnostic_properties(&manifest),
        vec!["java.tests.minimumLineCoveragePercent"]
    );
}

#[test]
fn test_classpath_array_skips_non_strings() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{"classpath":["a.jar", 7, "b.jar"]}}"#,
    );

    assert_eq!(diagnostic_properties(&manifest), vec!["java.classpath[1]"]);
    assert_eq!(
        manifest.descriptor().classpath_entries(),
        &["a.jar".to_string(), "b.jar".to_string()]
    );
}

// ============================================================================
// Dependencies
// ============================================================================

#[test]
fn test_dependencies_in_declaration_order() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{"dependencies":[
                {"publisher":"p1","project":"x","version":"1"},
                {"publisher":"p2","project":"y","version":"2"}
            ]}}"#,
    );

    assert!(!manifest.has_diagnostics());
    assert_eq!(
        manifest.descriptor().dependencies(),
        &[Dependency::new("p1", "x", "1"), Dependency::new("p2", "y", "2")]
    );
}

#[test]
fn test_malformed_dependency_dropped_with_one_diagnostic() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{"dependencies":[
                {"publisher":"p1","project":"x","version":"1"},
                {"publisher":"p2","version":"2"},
                {"publisher":"p3","project":"z","version":"3"}
            ]}}"#,
    );

    assert_eq!(
        diagnostic_properties(&manifest),
        vec!["java.dependencies[1].project"]
    );
    assert_eq!(
        manifest.descriptor().dependencies(),
        &[Dependency::new("p1", "x", "1"), Dependency::new("p3", "z", "3")]
    );
}

#[test]
fn test_dependency_reports_every_bad_field() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c",
            "java":{"dependencies":[{"publisher":"","project":4}, "oops"]}}"#,
    );

    assert_eq!(
        diagnostic_properties(&manifest),
        vec![
            "java.dependencies[0].publisher",
            "java.dependencies[0].project",
            "java.dependencies[0].version",
            "java.dependencies[1]",
        ]
    );
    assert!(manifest.descriptor().dependencies().is_empty());
}

#[test]
fn test_dependencies_not_an_array() {
    let manifest = parse(
        r#"{"publisher":"a","project":"b","version":"c","java":{"dependencies":{}}}"#,
    );

    assert_eq!(diagnostic_properties(&manifest), vec!["java.dependencies"]);
    assert!(manifest.descriptor().dependencies().is_empty());
}
