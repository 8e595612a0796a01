//! Artifact publication into the package store
//!
//! Layout under the store root:
//!
//! ```text
//! <store>/<publisher>/<project>/<version>/<project>.jar
//! <store>/<publisher>/<project>/<version>/project.json
//! <store>/<shortcut>.sh   (or .cmd on Windows)
//! ```
use crate::error::{BuildError, BuildResult};
use kiln_config::{Dependency, Descriptor, MANIFEST_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};

/// Flavour of launcher script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStyle {
    /// POSIX `sh`
    Shell,
    /// Windows batch
    Batch,
}

impl ScriptStyle {
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Batch
        } else {
            Self::Shell
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Shell => "sh",
            Self::Batch => "cmd",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Shell => ":",
            Self::Batch => ";",
        }
    }

    /// Token expanding to the script's own directory
    fn directory_token(self) -> &'static str {
        match self {
            Self::Shell => "$DIR/",
            Self::Batch => "%~dp0",
        }
    }
}

/// Where an install put things
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub folder: PathBuf,
    pub artifact: PathBuf,
    pub manifest: PathBuf,
    pub launcher: Option<PathBuf>,
}

/// Launcher script text; `entries` are store-relative artifact paths
pub fn launcher_script(style: ScriptStyle, main_class: &str, entries: &[String]) -> String {
    let classpath = entries
        .iter()
        .map(|entry| format!("{}{}", style.directory_token(), entry))
        .collect::<Vec<_>>()
        .join(style.separator());

    match style {
        ScriptStyle::Shell => format!(
            "#!/bin/sh\nDIR=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\nexec java -classpath \"{}\" {} \"$@\"\n",
            classpath, main_class
        ),
        ScriptStyle::Batch => format!(
            "@echo OFF\r\njava -classpath {} {} %*\r\n",
            classpath, main_class
        ),
    }
}

fn copy(from: &Path, to: &Path) -> BuildResult<()> {
    fs::copy(from, to).map_err(|e| BuildError::io(from, e))?;
    Ok(())
}

/// Copy the artifact and manifest into the store and write the launcher
pub fn install(
    descriptor: &Descriptor,
    manifest_path: &Path,
    artifact: &Path,
    store_root: &Path,
) -> BuildResult<Installation> {
    install_with_style(descriptor, manifest_path, artifact, store_root, ScriptStyle::native())
}

pub fn install_with_style(
    descriptor: &Descriptor,
    manifest_path: &Path,
    artifact: &Path,
    store_root: &Path,
    style: ScriptStyle,
) -> BuildResult<Installation> {
    let (Some(publisher), Some(project), Some(version)) = (
        descriptor.publisher.as_deref(),
        descriptor.project.as_deref(),
        descriptor.version.as_deref(),
    ) else {
        return Err(BuildError::InvalidManifest(
            "publisher, project and version are required to install".to_string(),
        ));
    };
    let coordinate = Dependency::new(publisher, project, version);

    let folder = store_root.join(coordinate.relative_folder());
    fs::create_dir_all(&folder).map_err(|e| BuildError::io(&folder, e))?;

    let installed_artifact = coordinate.artifact_path(store_root);
    copy(artifact, &installed_artifact)?;
    let installed_manifest = folder.join(MANIFEST_FILE_NAME);
    copy(manifest_path, &installed_manifest)?;
    tracing::debug!(folder = %folder.display(), "copied artifact and manifest");

    let launcher = match descriptor.main_class() {
        Some(main_class) => {
            let name = descriptor.shortcut_name().unwrap_or(project);
            let path = store_root.join(format!("{}.{}", name, style.extension()));

            let entries: Vec<String> = std::iter::once(&coordinate)
                .chain(descriptor.dependencies())
                .map(ToString::to_string)
                .collect();
            let script = launcher_script(style, main_class, &entries);
            fs::write(&path, script).map_err(|e| BuildError::io(&path, e))?;
            make_executable(&path)?;
            Some(path)
        }
        None => None,
    };

    Ok(Installation {
        folder,
        artifact: installed_artifact,
        manifest: installed_manifest,
        launcher,
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> BuildResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)
        .map_err(|e| BuildError::io(path, e))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions).map_err(|e| BuildError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> BuildResult<()> {
    Ok(())
}
