//! kiln build pipeline
//!
//! Drives the external Java tools for a project described by `project.json`:
//! - Dependency-to-classpath resolution against the package store
//! - Timestamp-based staleness detection for incremental compilation
//! - Compilation, packaging, test execution and the line coverage gate
//! - Publication into the package store with a launcher script

pub mod classpath;
pub mod compiler;
pub mod coverage;
pub mod discovery;
pub mod error;
pub mod packager;
pub mod pipeline;
pub mod publisher;
pub mod relay;
pub mod staleness;
pub mod test_runner;
pub mod tool;
pub mod toolchain;

// Re-export main types
pub use classpath::{join_classpath, resolve_classpath, CLASSPATH_SEPARATOR};
pub use compiler::{remove_orphaned_classes, CompileRequest, Compiler};
pub use coverage::{CoverageReport, CoverageRow, CoverageVerdict};
pub use error::{BuildError, BuildResult};
pub use packager::Packager;
pub use pipeline::{
    BuildLayout, Pipeline, PipelineConfig, PipelineOutcome, Stage, StageReport, StageStatus,
    TestOptions,
};
pub use publisher::{install, launcher_script, Installation, ScriptStyle};
pub use staleness::{needs_recompilation, StaleReason};
pub use test_runner::{CoverageOutcome, CoverageRequest, HarnessRequest, TestRunner};
pub use tool::{Invocation, ProcessRunner, ToolRunner};
pub use toolchain::Toolchain;

// Re-export kiln-config types for convenience
pub use kiln_config::{Dependency, Descriptor, ProjectManifest};
