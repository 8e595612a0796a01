//! Dependency-to-classpath resolution
use kiln_config::Descriptor;
use std::path::Path;

/// Separator between classpath entries on this platform
pub const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Explicit classpath entries verbatim, then one store path per dependency
///
/// Order is preserved exactly as declared; entries are neither deduplicated
/// nor checked for existence.
pub fn resolve_classpath(descriptor: &Descriptor, store_root: &Path) -> Vec<String> {
    descriptor
        .classpath_entries()
        .iter()
        .cloned()
        .chain(
            descriptor
                .dependencies()
                .iter()
                .map(|dep| dep.artifact_path(store_root).to_string_lossy().into_owned()),
        )
        .collect()
}

/// Join entries with the platform separator
pub fn join_classpath<S: AsRef<str>>(entries: &[S]) -> String {
    entries
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CLASSPATH_SEPARATOR)
}
