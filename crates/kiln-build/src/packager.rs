//! Artifact packaging with `jar`
use crate::error::{BuildError, BuildResult};
use crate::tool::{Invocation, ToolRunner};
use crate::toolchain::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the generated archive manifest, inside the output folder
pub const ARCHIVE_MANIFEST_NAME: &str = "manifest.mf";

/// Archive manifest text for an executable artifact
pub fn archive_manifest(main_class: &str) -> String {
    format!("Manifest-Version: 1.0\nMain-Class: {}\n", main_class)
}

/// Packs compiled classes into an artifact
pub struct Packager<'t> {
    toolchain: &'t Toolchain,
}

impl<'t> Packager<'t> {
    pub fn new(toolchain: &'t Toolchain) -> Self {
        Self { toolchain }
    }

    /// Archiver command line; `manifest` is passed only for executable artifacts
    pub fn invocation(
        &self,
        output_folder: &Path,
        classes_folder: &Path,
        artifact: &Path,
        manifest: Option<&Path>,
    ) -> Invocation {
        let mode = if manifest.is_some() { "cfm" } else { "cf" };
        let mut invocation = Invocation::new(&self.toolchain.jar)
            .arg(mode)
            .arg(artifact)
            .current_dir(output_folder);
        if let Some(manifest) = manifest {
            invocation = invocation.arg(manifest);
        }
        invocation.arg("-C").arg(classes_folder).arg(".")
    }

    /// Write the archive manifest (when there is a main class) and run the archiver.
    /// Returns true when the archiver exits with 0.
    pub fn package(
        &self,
        runner: &mut dyn ToolRunner,
        output_folder: &Path,
        classes_folder: &Path,
        artifact: &Path,
        main_class: Option<&str>,
    ) -> BuildResult<bool> {
        let manifest = match main_class {
            Some(main_class) => Some(write_archive_manifest(output_folder, main_class)?),
            None => None,
        };

        let invocation = self.invocation(output_folder, classes_folder, artifact, manifest.as_deref());
        Ok(runner.run(&invocation)? == 0)
    }
}

fn write_archive_manifest(output_folder: &Path, main_class: &str) -> BuildResult<PathBuf> {
    fs::create_dir_all(output_folder).map_err(|e| BuildError::io(output_folder, e))?;
    let path = output_folder.join(ARCHIVE_MANIFEST_NAME);
    fs::write(&path, archive_manifest(main_class)).map_err(|e| BuildError::io(&path, e))?;
    Ok(path)
}
