//! Compiler invocation and orphaned output cleanup
use crate::classpath::join_classpath;
use crate::discovery::discover_files;
use crate::error::{BuildError, BuildResult};
use crate::tool::{Invocation, ToolRunner};
use crate::toolchain::{Toolchain, CLASS_EXTENSION, SOURCE_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything needed to compile one build unit
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub classpath: Vec<String>,
    pub source_folder: PathBuf,
    pub source_files: Vec<PathBuf>,
    pub output_folder: PathBuf,
    pub language_version: Option<String>,
}

/// Drives `javac` for a build unit
pub struct Compiler<'t> {
    toolchain: &'t Toolchain,
}

impl<'t> Compiler<'t> {
    pub fn new(toolchain: &'t Toolchain) -> Self {
        Self { toolchain }
    }

    /// Build the compiler command line for a request
    pub fn invocation(&self, request: &CompileRequest) -> Invocation {
        let mut invocation = Invocation::new(&self.toolchain.javac);

        if !request.classpath.is_empty() {
            invocation = invocation
                .arg("-classpath")
                .arg(join_classpath(&request.classpath));
        }

        invocation = invocation
            .arg("-d")
            .arg(&request.output_folder)
            .args(["-g", "-Xlint:unchecked", "-Xlint:deprecation"]);

        if let Some(version) = &request.language_version {
            invocation = invocation
                .arg("-source")
                .arg(version)
                .arg("-target")
                .arg(version);
            if let Some(boot) = self.toolchain.boot_classpath_for(version) {
                invocation = invocation.arg("-bootclasspath").arg(boot);
            }
        }

        invocation.args(&request.source_files)
    }

    /// Compile the unit and clean up orphaned outputs; returns the compiler exit code
    pub fn compile(&self, runner: &mut dyn ToolRunner, request: &CompileRequest) -> BuildResult<i32> {
        fs::create_dir_all(&request.output_folder)
            .map_err(|e| BuildError::io(&request.output_folder, e))?;

        let code = runner.run(&self.invocation(request))?;

        let removed = remove_orphaned_classes(&request.source_folder, &request.output_folder)?;
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "removed orphaned class files");
        }
        Ok(code)
    }
}

/// Source file a compiled class came from, relative to the source folder.
/// Nested and anonymous classes (`Outer$Inner.class`) map to their outer source.
fn source_for_class(relative_class: &Path) -> Option<PathBuf> {
    let name = relative_class.file_name()?.to_str()?;
    let stem = match name.find('$') {
        Some(index) => &name[..index],
        None => name.strip_suffix(&format!(".{}", CLASS_EXTENSION))?,
    };
    let source_name = format!("{}.{}", stem, SOURCE_EXTENSION);
    Some(match relative_class.parent() {
        Some(parent) => parent.join(source_name),
        None => PathBuf::from(source_name),
    })
}

/// Delete every compiled class whose source no longer exists
pub fn remove_orphaned_classes(source_folder: &Path, output_folder: &Path) -> BuildResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for class_file in discover_files(output_folder, CLASS_EXTENSION)? {
        let Ok(relative) = class_file.strip_prefix(output_folder) else {
            continue;
        };
        let Some(source) = source_for_class(relative) else {
            continue;
        };
        if !source_folder.join(source).exists() {
            fs::remove_file(&class_file).map_err(|e| BuildError::io(&class_file, e))?;
            tracing::debug!(path = %class_file.display(), "removed orphaned class");
            removed.push(class_file);
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn request(version: Option<&str>, classpath: Vec<&str>) -> CompileRequest {
        CompileRequest {
            classpath: classpath.into_iter().map(String::from).collect(),
            source_folder: PathBuf::from("sources"),
            source_files: vec![PathBuf::from("sources/A.java"), PathBuf::from("sources/p/B.java")],
            output_folder: PathBuf::from("outputs/sources"),
            language_version: version.map(String::from),
        }
    }

    #[test]
    fn test_arguments_without_version_or_classpath() {
        let toolchain = Toolchain::default();
        let invocation = Compiler::new(&toolchain).invocation(&request(None, vec![]));
        assert_eq!(
            invocation.argument_strings(),
            vec![
                "-d",
                "outputs/sources",
                "-g",
                "-Xlint:unchecked",
                "-Xlint:deprecation",
                "sources/A.java",
                "sources/p/B.java",
            ]
        );
    }

    #[test]
    fn test_arguments_with_classpath_and_modern_version() {
        let toolchain = Toolchain::default();
        let invocation =
            Compiler::new(&toolchain).invocation(&request(Some("17"), vec!["a.jar", "b.jar"]));
        let args = invocation.argument_strings();

        assert_eq!(args[0], "-classpath");
        assert_eq!(args[1], join_classpath(&["a.jar".to_string(), "b.jar".to_string()]));
        assert_eq!(&args[7..11], &["-source", "17", "-target", "17"]);
        assert!(!args.contains(&"-bootclasspath".to_string()));
    }

    #[test]
    fn test_legacy_version_adds_boot_classpath() {
        let toolchain = Toolchain::default();
        let invocation = Compiler::new(&toolchain).invocation(&request(Some("1.8"), vec![]));
        let args = invocation.argument_strings();

        let position = args.iter().position(|a| a == "-bootclasspath").unwrap();
        assert_eq!(
            PathBuf::from(&args[position + 1]),
            toolchain.legacy_runtime
        );
        assert_eq!(args[position + 2], "sources/A.java");
    }

    #[test]
    fn test_source_for_nested_class() {
        assert_eq!(
            source_for_class(Path::new("p/Outer$Inner$1.class")),
            Some(PathBuf::from("p/Outer.java"))
        );
        assert_eq!(
            source_for_class(Path::new("Main.class")),
            Some(PathBuf::from("Main.java"))
        );
    }

    #[test]
    fn test_remove_orphaned_classes() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("sources");
        let outputs = temp.path().join("outputs");
        fs::create_dir_all(sources.join("p")).unwrap();
        fs::create_dir_all(outputs.join("p")).unwrap();

        fs::write(sources.join("p/Kept.java"), "").unwrap();
        for class in ["p/Kept.class", "p/Kept$1.class", "p/Gone.class", "p/Gone$Inner.class"] {
            fs::write(outputs.join(class), "").unwrap();
        }

        let removed = remove_orphaned_classes(&sources, &outputs).unwrap();

        assert_eq!(
            removed,
            vec![outputs.join("p/Gone$Inner.class"), outputs.join("p/Gone.class")]
        );
        assert!(outputs.join("p/Kept.class").exists());
        assert!(outputs.join("p/Kept$1.class").exists());
    }

    #[test]
    fn test_remove_orphans_with_missing_output_folder() {
        let temp = TempDir::new().unwrap();
        let removed =
            remove_orphaned_classes(&temp.path().join("src"), &temp.path().join("out")).unwrap();
        assert!(removed.is_empty());
    }
}
