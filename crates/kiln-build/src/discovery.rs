//! Source file discovery and naming
use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All files under `folder` with the given extension, sorted
///
/// A folder that doesn't exist simply has no files.
pub fn discover_files(folder: &Path, extension: &str) -> BuildResult<Vec<PathBuf>> {
    if !folder.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(folder).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Path of `file` relative to `folder`, with its extension swapped
pub fn relative_with_extension(folder: &Path, file: &Path, extension: &str) -> Option<PathBuf> {
    let relative = file.strip_prefix(folder).ok()?;
    Some(relative.with_extension(extension))
}

/// Fully-qualified class name of a source or class file, e.g. `acme/util/Text.java` → `acme.util.Text`
pub fn class_name(folder: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(folder).ok()?.with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}
