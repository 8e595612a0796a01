//! Staleness detection for incremental builds
//!
//! A build unit is stale when any source file lacks a compiled output that is
//! strictly newer than it. Stale units are recompiled as a whole.
use crate::discovery::relative_with_extension;
use crate::toolchain::CLASS_EXTENSION;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a build unit needs recompiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// The compiled output doesn't exist
    MissingOutput { source: PathBuf, output: PathBuf },
    /// The compiled output isn't newer than its source
    OutdatedOutput { source: PathBuf, output: PathBuf },
    /// A timestamp couldn't be read, so the unit is rebuilt to be safe
    UnknownTimestamp { path: PathBuf },
}

/// Expected compiled output for a source file
pub fn output_path_for(source_folder: &Path, source: &Path, output_folder: &Path) -> Option<PathBuf> {
    relative_with_extension(source_folder, source, CLASS_EXTENSION)
        .map(|relative| output_folder.join(relative))
}

/// Does this build unit need to be recompiled at all?
pub fn needs_recompilation(source_folder: &Path, source_files: &[PathBuf], output_folder: &Path) -> bool {
    first_stale(source_folder, source_files, output_folder).is_some()
}

/// The first reason the unit is stale, or `None` when every output is current
pub fn first_stale(
    source_folder: &Path,
    source_files: &[PathBuf],
    output_folder: &Path,
) -> Option<StaleReason> {
    for source in source_files {
        let Some(output) = output_path_for(source_folder, source, output_folder) else {
            return Some(StaleReason::UnknownTimestamp {
                path: source.clone(),
            });
        };

        if !output.exists() {
            return Some(StaleReason::MissingOutput {
                source: source.clone(),
                output,
            });
        }

        let Some(source_time) = modified(source) else {
            return Some(StaleReason::UnknownTimestamp {
                path: source.clone(),
            });
        };
        let Some(output_time) = modified(&output) else {
            return Some(StaleReason::UnknownTimestamp { path: output });
        };

        // Equal timestamps count as stale
        if output_time <= source_time {
            return Some(StaleReason::OutdatedOutput {
                source: source.clone(),
                output,
            });
        }
    }
    None
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
