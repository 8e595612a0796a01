//! Build, test and install orchestration
//!
//! Each operation runs a fixed sequence of stages and stops at the first
//! failure. Informational skips ("nothing to compile") let the sequence
//! continue with whatever was built before.
use crate::classpath::resolve_classpath;
use crate::compiler::{CompileRequest, Compiler};
use crate::discovery::discover_files;
use crate::error::{BuildError, BuildResult};
use crate::packager::Packager;
use crate::publisher;
use crate::staleness::needs_recompilation;
use crate::test_runner::{
    open_in_viewer, test_units, CoverageOutcome, CoverageRequest, HarnessRequest, TestRunner,
};
use crate::tool::ToolRunner;
use crate::toolchain::{Toolchain, CLASS_EXTENSION, SOURCE_EXTENSION};
use kiln_config::dependency::ARTIFACT_EXTENSION;
use kiln_config::{Descriptor, ProjectManifest};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Output-folder layout shared by every operation
pub const COMPILED_SOURCES_FOLDER: &str = "sources";
pub const COMPILED_TESTS_FOLDER: &str = "tests";
pub const COVERAGE_DATA_FILE: &str = "coverage.exec";
pub const COVERAGE_HTML_FOLDER: &str = "coverage";
pub const COVERAGE_CSV_FILE: &str = "coverage.csv";

/// Settings that don't come from the project manifest
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store_root: PathBuf,
    pub toolchain: Toolchain,
    /// Open the HTML coverage report once it is written
    pub open_coverage_report: bool,
}

/// Options for the test operation
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    pub pattern: Option<String>,
    pub coverage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    CompileSources,
    Package,
    CompileTests,
    RunTests,
    Coverage,
    Publish,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CompileSources => "compile-sources",
            Self::Package => "package",
            Self::CompileTests => "compile-tests",
            Self::RunTests => "run-tests",
            Self::Coverage => "coverage",
            Self::Publish => "publish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Skipped { reason: String },
    Failed { reason: String },
}

impl StageStatus {
    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub status: StageStatus,
    pub elapsed_secs: f64,
}

/// Per-stage results of one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub succeeded: bool,
    pub stages: Vec<StageReport>,
}

impl PipelineOutcome {
    fn new() -> Self {
        Self {
            succeeded: true,
            stages: Vec::new(),
        }
    }

    fn record(&mut self, stage: Stage, status: StageStatus, started: Instant) {
        if status.is_failure() {
            self.succeeded = false;
        }
        self.stages.push(StageReport {
            stage,
            status,
            elapsed_secs: started.elapsed().as_secs_f64(),
        });
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    /// The stage that stopped the operation, if any
    pub fn failure(&self) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.status.is_failure())
    }
}

/// Where a project's inputs and outputs live
#[derive(Debug, Clone, PartialEq)]
pub struct BuildLayout {
    pub sources: Option<PathBuf>,
    pub sources_version: Option<String>,
    pub tests: Option<PathBuf>,
    pub tests_version: Option<String>,
    pub coverage_threshold: Option<f64>,
    pub outputs: PathBuf,
    /// `<outputs>/<project>.jar`; unknown without a project name
    pub artifact: Option<PathBuf>,
}

impl BuildLayout {
    /// Resolve folders against the project directory.
    /// Fails with a reason when there is nowhere to put outputs.
    pub fn resolve(project_dir: &Path, descriptor: &Descriptor) -> Result<Self, String> {
        let java = descriptor
            .java
            .as_ref()
            .ok_or("the 'java' section is missing or invalid")?;
        let outputs = java
            .outputs
            .as_ref()
            .map(|folder| project_dir.join(folder))
            .ok_or("'java.outputs' is invalid")?;

        let artifact = descriptor
            .project
            .as_ref()
            .map(|project| outputs.join(format!("{}.{}", project, ARTIFACT_EXTENSION)));

        Ok(Self {
            sources: java.sources.as_ref().map(|s| project_dir.join(&s.folder)),
            sources_version: java.sources.as_ref().and_then(|s| s.version.clone()),
            tests: java.tests.as_ref().map(|t| project_dir.join(&t.folder)),
            tests_version: java.tests.as_ref().and_then(|t| t.version.clone()),
            coverage_threshold: java
                .tests
                .as_ref()
                .and_then(|t| t.minimum_line_coverage_percent),
            outputs,
            artifact,
        })
    }

    pub fn compiled_sources(&self) -> PathBuf {
        self.outputs.join(COMPILED_SOURCES_FOLDER)
    }

    pub fn compiled_tests(&self) -> PathBuf {
        self.outputs.join(COMPILED_TESTS_FOLDER)
    }

    pub fn coverage_data(&self) -> PathBuf {
        self.outputs.join(COVERAGE_DATA_FILE)
    }

    pub fn coverage_html(&self) -> PathBuf {
        self.outputs.join(COVERAGE_HTML_FOLDER)
    }

    pub fn coverage_csv(&self) -> PathBuf {
        self.outputs.join(COVERAGE_CSV_FILE)
    }
}

/// Anchor a relative project directory at the working directory.
///
/// The archiver runs from inside the outputs folder, so every path handed to
/// a tool must survive a change of working directory.
fn absolute(dir: PathBuf) -> PathBuf {
    if dir.is_absolute() {
        return dir;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(dir),
        Err(e) => {
            tracing::warn!(error = %e, dir = %dir.display(), "cannot resolve project directory");
            dir
        }
    }
}

/// Runs build, test and install for one project
pub struct Pipeline<R: ToolRunner> {
    project_dir: PathBuf,
    manifest: ProjectManifest,
    config: PipelineConfig,
    runner: R,
}

impl<R: ToolRunner> Pipeline<R> {
    /// Load `project.json` from the project directory
    pub fn load(project_dir: impl Into<PathBuf>, config: PipelineConfig, runner: R) -> BuildResult<Self> {
        let project_dir = project_dir.into();
        let manifest = ProjectManifest::load(&project_dir)?;
        Ok(Self::new(project_dir, manifest, config, runner))
    }

    pub fn new(
        project_dir: impl Into<PathBuf>,
        manifest: ProjectManifest,
        config: PipelineConfig,
        runner: R,
    ) -> Self {
        Self {
            project_dir: absolute(project_dir.into()),
            manifest,
            config,
            runner,
        }
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Compile sources, package, compile tests
    pub fn build(&mut self, out: &mut dyn Write) -> BuildResult<PipelineOutcome> {
        let mut outcome = PipelineOutcome::new();
        self.report_diagnostics(out)?;
        self.run_build(&mut outcome, out)?;
        Ok(outcome)
    }

    /// Build, then run the tests and the optional coverage gate
    pub fn test(&mut self, options: &TestOptions, out: &mut dyn Write) -> BuildResult<PipelineOutcome> {
        let mut outcome = PipelineOutcome::new();
        self.report_diagnostics(out)?;
        self.run_test(options, &mut outcome, out)?;
        Ok(outcome)
    }

    /// Test, then publish into the package store
    pub fn install(&mut self, options: &TestOptions, out: &mut dyn Write) -> BuildResult<PipelineOutcome> {
        let mut outcome = PipelineOutcome::new();
        self.report_diagnostics(out)?;
        if let Some(layout) = self.run_test(options, &mut outcome, out)? {
            let started = Instant::now();
            let status = self.publish(&layout, out)?;
            outcome.record(Stage::Publish, status, started);
        }
        Ok(outcome)
    }

    fn report_diagnostics(&self, out: &mut dyn Write) -> BuildResult<()> {
        for diagnostic in self.manifest.diagnostics() {
            writeln!(out, "{}", diagnostic)?;
        }
        Ok(())
    }

    fn classpath(&self) -> Vec<String> {
        resolve_classpath(self.manifest.descriptor(), &self.config.store_root)
    }

    /// Returns the layout when every build stage passed
    fn run_build(&mut self, outcome: &mut PipelineOutcome, out: &mut dyn Write) -> BuildResult<Option<BuildLayout>> {
        let started = Instant::now();
        let layout = match BuildLayout::resolve(&self.project_dir, self.manifest.descriptor()) {
            Ok(layout) => layout,
            Err(reason) => {
                writeln!(out, "Cannot build: {}.", reason)?;
                outcome.record(Stage::CompileSources, StageStatus::failed(reason), started);
                return Ok(None);
            }
        };

        let (status, compiled) = self.compile_sources(&layout, out)?;
        outcome.record(Stage::CompileSources, status, started);
        if !outcome.succeeded {
            return Ok(None);
        }

        let started = Instant::now();
        let status = self.package(&layout, compiled, out)?;
        outcome.record(Stage::Package, status, started);
        if !outcome.succeeded {
            return Ok(None);
        }

        let started = Instant::now();
        let status = self.compile_tests(&layout, out)?;
        outcome.record(Stage::CompileTests, status, started);
        Ok(outcome.succeeded.then_some(layout))
    }

    fn run_test(
        &mut self,
        options: &TestOptions,
        outcome: &mut PipelineOutcome,
        out: &mut dyn Write,
    ) -> BuildResult<Option<BuildLayout>> {
        let Some(layout) = self.run_build(outcome, out)? else {
            return Ok(None);
        };

        let started = Instant::now();
        let status = self.run_tests(&layout, options, out)?;
        let ran = matches!(status, StageStatus::Succeeded);
        outcome.record(Stage::RunTests, status, started);
        if !outcome.succeeded {
            return Ok(None);
        }

        if options.coverage && ran {
            let started = Instant::now();
            let status = self.coverage(&layout, out)?;
            outcome.record(Stage::Coverage, status, started);
        }
        Ok(outcome.succeeded.then_some(layout))
    }

    /// Compile main sources; the flag says whether the compiler actually ran
    fn compile_sources(&mut self, layout: &BuildLayout, out: &mut dyn Write) -> BuildResult<(StageStatus, bool)> {
        let Some(source_folder) = &layout.sources else {
            writeln!(out, "Cannot compile: 'java.sources' is invalid.")?;
            return Ok((StageStatus::failed("'java.sources' is invalid"), false));
        };

        let source_files = discover_files(source_folder, SOURCE_EXTENSION)?;
        if source_files.is_empty() {
            writeln!(out, "No source files found to compile.")?;
            return Ok((StageStatus::skipped("no source files"), false));
        }

        let output_folder = layout.compiled_sources();
        if !needs_recompilation(source_folder, &source_files, &output_folder) {
            writeln!(out, "No files need to be compiled.")?;
            return Ok((StageStatus::skipped("up to date"), false));
        }

        let request = CompileRequest {
            classpath: self.classpath(),
            source_folder: source_folder.clone(),
            source_files,
            output_folder,
            language_version: layout.sources_version.clone(),
        };
        let status = self.compile_unit(&request, "source", out)?;
        let compiled = !status.is_failure();
        Ok((status, compiled))
    }

    fn compile_tests(&mut self, layout: &BuildLayout, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let Some(tests_folder) = &layout.tests else {
            writeln!(out, "Cannot compile tests: 'java.tests' is invalid.")?;
            return Ok(StageStatus::failed("'java.tests' is invalid"));
        };

        let test_files = discover_files(tests_folder, SOURCE_EXTENSION)?;
        if test_files.is_empty() {
            writeln!(out, "No test files found to compile.")?;
            return Ok(StageStatus::skipped("no test files"));
        }

        let output_folder = layout.compiled_tests();
        if !needs_recompilation(tests_folder, &test_files, &output_folder) {
            writeln!(out, "No test files need to be compiled.")?;
            return Ok(StageStatus::skipped("up to date"));
        }

        let mut classpath = self.classpath();
        classpath.push(layout.compiled_sources().to_string_lossy().into_owned());

        let request = CompileRequest {
            classpath,
            source_folder: tests_folder.clone(),
            source_files: test_files,
            output_folder,
            language_version: layout.tests_version.clone(),
        };
        self.compile_unit(&request, "test", out)
    }

    fn compile_unit(&mut self, request: &CompileRequest, kind: &str, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let count = request.source_files.len();
        writeln!(out, "Compiling {} {} file(s)...", count, kind)?;
        out.flush()?;

        let started = Instant::now();
        let code = Compiler::new(&self.config.toolchain).compile(&mut self.runner, request)?;
        if code != 0 {
            writeln!(out, "Compilation failed.")?;
            return Ok(StageStatus::failed(format!("compiler exited with code {}", code)));
        }

        writeln!(
            out,
            "Compiled {} {} file(s) in {:.2}s",
            count,
            kind,
            started.elapsed().as_secs_f64()
        )?;
        Ok(StageStatus::Succeeded)
    }

    fn package(&mut self, layout: &BuildLayout, compiled: bool, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let classes = layout.compiled_sources();
        let Some(artifact) = &layout.artifact else {
            writeln!(out, "Cannot package: 'project' is not set.")?;
            return Ok(StageStatus::failed("'project' is not set"));
        };

        let has_classes = !discover_files(&classes, CLASS_EXTENSION)?.is_empty();
        if !has_classes {
            return Ok(StageStatus::skipped("nothing to package"));
        }
        if !compiled && artifact.exists() {
            tracing::debug!(artifact = %artifact.display(), "artifact is up to date");
            return Ok(StageStatus::skipped("artifact is up to date"));
        }

        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(out, "Packaging {}...", name)?;
        out.flush()?;

        let packaged = Packager::new(&self.config.toolchain).package(
            &mut self.runner,
            &layout.outputs,
            &classes,
            artifact,
            self.manifest.descriptor().main_class(),
        )?;
        if packaged {
            Ok(StageStatus::Succeeded)
        } else {
            writeln!(out, "Packaging failed.")?;
            Ok(StageStatus::failed("archiver failed"))
        }
    }

    fn run_tests(&mut self, layout: &BuildLayout, options: &TestOptions, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let units = match &layout.tests {
            Some(tests_folder) => test_units(tests_folder, &discover_files(tests_folder, SOURCE_EXTENSION)?),
            None => Vec::new(),
        };
        if units.is_empty() {
            writeln!(out, "No tests found to run.")?;
            return Ok(StageStatus::skipped("no tests"));
        }

        let mut classpath = self.classpath();
        classpath.push(layout.compiled_sources().to_string_lossy().into_owned());
        classpath.push(layout.compiled_tests().to_string_lossy().into_owned());

        let coverage_data = if options.coverage {
            let data = layout.coverage_data();
            // The agent appends to existing data
            if data.exists() {
                fs::remove_file(&data).map_err(|e| BuildError::io(&data, e))?;
            }
            Some(data)
        } else {
            None
        };

        let request = HarnessRequest {
            classpath,
            test_units: units,
            pattern: options.pattern.clone(),
            coverage_data,
        };

        writeln!(out, "Running {} test class(es)...", request.test_units.len())?;
        out.flush()?;
        if TestRunner::new(&self.config.toolchain).run_harness(&mut self.runner, &request)? {
            writeln!(out, "Tests passed.")?;
            Ok(StageStatus::Succeeded)
        } else {
            writeln!(out, "Tests failed.")?;
            Ok(StageStatus::failed("test harness reported failures"))
        }
    }

    fn coverage(&mut self, layout: &BuildLayout, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let classes_folder = layout.compiled_sources();
        let Some(sources_folder) = layout.sources.clone().filter(|_| classes_folder.exists()) else {
            return Ok(StageStatus::skipped("no compiled sources"));
        };

        let threshold = layout.coverage_threshold;
        let request = CoverageRequest {
            execution_data: layout.coverage_data(),
            classes_folder,
            sources_folder,
            html_report: layout.coverage_html(),
            csv_report: threshold.map(|_| layout.coverage_csv()),
        };

        let outcome = TestRunner::new(&self.config.toolchain).report_coverage(
            &mut self.runner,
            &request,
            threshold,
            out,
        )?;

        let status = match &outcome {
            CoverageOutcome::ReportFailed(code) => {
                writeln!(out, "Coverage report failed.")?;
                return Ok(StageStatus::failed(format!("coverage tool exited with code {}", code)));
            }
            CoverageOutcome::Reported => StageStatus::Succeeded,
            CoverageOutcome::Checked(verdict) if verdict.passed() => StageStatus::Succeeded,
            CoverageOutcome::Checked(verdict) => StageStatus::failed(format!(
                "line coverage below {}% in {} class(es)",
                verdict.threshold,
                verdict.failing.len()
            )),
        };

        writeln!(out, "Coverage report: {}", request.html_report.display())?;
        if self.config.open_coverage_report {
            open_in_viewer(&request.html_report.join("index.html"));
        }
        Ok(status)
    }

    fn publish(&mut self, layout: &BuildLayout, out: &mut dyn Write) -> BuildResult<StageStatus> {
        let artifact = match &layout.artifact {
            Some(artifact) if artifact.exists() => artifact,
            _ => {
                writeln!(out, "Cannot install: no artifact was built.")?;
                return Ok(StageStatus::failed("no artifact to install"));
            }
        };

        let installation = publisher::install(
            self.manifest.descriptor(),
            self.manifest.path(),
            artifact,
            &self.config.store_root,
        )?;
        writeln!(out, "Installed to {}", installation.folder.display())?;
        if let Some(launcher) = &installation.launcher {
            writeln!(out, "Launcher: {}", launcher.display())?;
        }
        Ok(StageStatus::Succeeded)
    }
}
