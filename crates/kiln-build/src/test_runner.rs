//! Test harness and coverage report invocation
use crate::classpath::join_classpath;
use crate::coverage::{CoverageReport, CoverageVerdict};
use crate::discovery::class_name;
use crate::error::BuildResult;
use crate::tool::{Invocation, ToolRunner};
use crate::toolchain::Toolchain;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A test harness run
#[derive(Debug, Clone, Default)]
pub struct HarnessRequest {
    pub classpath: Vec<String>,
    /// Fully-qualified test class names
    pub test_units: Vec<String>,
    pub pattern: Option<String>,
    /// Execution data file; instruments the run when set
    pub coverage_data: Option<PathBuf>,
}

/// Inputs and outputs of the coverage report tool
#[derive(Debug, Clone)]
pub struct CoverageRequest {
    pub execution_data: PathBuf,
    pub classes_folder: PathBuf,
    pub sources_folder: PathBuf,
    pub html_report: PathBuf,
    /// CSV output, requested only when a threshold is configured
    pub csv_report: Option<PathBuf>,
}

/// What the coverage pass produced
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageOutcome {
    /// The report tool exited with this non-zero code
    ReportFailed(i32),
    /// Report written, no threshold to check
    Reported,
    /// Report written and checked against the threshold
    Checked(CoverageVerdict),
}

impl CoverageOutcome {
    pub fn passed(&self) -> bool {
        match self {
            Self::ReportFailed(_) => false,
            Self::Reported => true,
            Self::Checked(verdict) => verdict.passed(),
        }
    }
}

/// Test unit names for test sources: relative path, separators to dots, extension dropped
pub fn test_units(tests_folder: &Path, test_files: &[PathBuf]) -> Vec<String> {
    test_files
        .iter()
        .filter_map(|file| class_name(tests_folder, file))
        .collect()
}

/// Drives the test harness and the coverage report tool
pub struct TestRunner<'t> {
    toolchain: &'t Toolchain,
}

impl<'t> TestRunner<'t> {
    pub fn new(toolchain: &'t Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn harness_invocation(&self, request: &HarnessRequest) -> BuildResult<Invocation> {
        let mut invocation = Invocation::new(&self.toolchain.java)
            .arg("-classpath")
            .arg(join_classpath(&request.classpath));

        if let Some(data) = &request.coverage_data {
            let agent = self.toolchain.jacoco_agent()?;
            invocation = invocation.arg(format!(
                "-javaagent:{}=destfile={}",
                agent.display(),
                data.display()
            ));
        }

        invocation = invocation.arg(&self.toolchain.test_runner);
        if let Some(pattern) = &request.pattern {
            invocation = invocation.arg(format!("--pattern={}", pattern));
        }
        Ok(invocation.args(&request.test_units))
    }

    pub fn report_invocation(&self, request: &CoverageRequest) -> BuildResult<Invocation> {
        let cli = self.toolchain.jacoco_cli()?;
        let mut invocation = Invocation::new(&self.toolchain.java)
            .arg("-jar")
            .arg(cli)
            .arg("report")
            .arg(&request.execution_data)
            .arg("--classfiles")
            .arg(&request.classes_folder)
            .arg("--sourcefiles")
            .arg(&request.sources_folder)
            .arg("--html")
            .arg(&request.html_report);
        if let Some(csv) = &request.csv_report {
            invocation = invocation.arg("--csv").arg(csv);
        }
        Ok(invocation)
    }

    /// Run the harness; passes iff it exits with 0
    pub fn run_harness(&self, runner: &mut dyn ToolRunner, request: &HarnessRequest) -> BuildResult<bool> {
        let invocation = self.harness_invocation(request)?;
        Ok(runner.run(&invocation)? == 0)
    }

    /// Generate the coverage report and, with a threshold, gate on line coverage
    pub fn report_coverage(
        &self,
        runner: &mut dyn ToolRunner,
        request: &CoverageRequest,
        threshold: Option<f64>,
        out: &mut dyn Write,
    ) -> BuildResult<CoverageOutcome> {
        let code = runner.run(&self.report_invocation(request)?)?;
        if code != 0 {
            return Ok(CoverageOutcome::ReportFailed(code));
        }

        let (Some(threshold), Some(csv)) = (threshold, &request.csv_report) else {
            return Ok(CoverageOutcome::Reported);
        };

        let report = CoverageReport::from_path(csv)?;
        let verdict = report.evaluate(threshold);
        report.write_verdict(&verdict, out)?;
        Ok(CoverageOutcome::Checked(verdict))
    }
}

/// Command that opens a file in the platform's default viewer
pub fn viewer_command(target: &Path) -> Command {
    let mut command = if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(target);
    command
}

/// Open a report in the system viewer without waiting. Failures are only logged.
pub fn open_in_viewer(target: &Path) {
    let spawned = viewer_command(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => tracing::debug!(path = %target.display(), "opened coverage report"),
        Err(e) => tracing::warn!(path = %target.display(), error = %e, "could not open coverage report"),
    }
}
