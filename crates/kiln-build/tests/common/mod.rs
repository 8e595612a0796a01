//! Shared fixtures for pipeline tests
//!
//! `FakeTools` stands in for the JDK: it records every invocation and
//! simulates the compiler and archiver by writing the files they would write.

#![allow(dead_code)]

use kiln_build::{BuildResult, Invocation, Pipeline, PipelineConfig, ToolRunner, Toolchain};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const MINIMAL_MANIFEST: &str = r#"{"publisher":"a","project":"b","version":"c","java":{}}"#;

pub const COVERAGE_HEADER: &str = "GROUP,PACKAGE,CLASS,INSTRUCTION_MISSED,INSTRUCTION_COVERED,BRANCH_MISSED,BRANCH_COVERED,LINE_MISSED,LINE_COVERED,COMPLEXITY_MISSED,COMPLEXITY_COVERED,METHOD_MISSED,METHOD_COVERED\n";

#[derive(Debug, Default)]
pub struct FakeTools {
    pub invocations: Vec<Invocation>,
    /// Folders that compiled sources are relative to
    pub roots: Vec<PathBuf>,
    pub javac_exit: i32,
    pub jar_exit: i32,
    pub harness_exit: i32,
    pub report_exit: i32,
    /// Written to the `--csv` target of the coverage report tool
    pub coverage_csv: String,
}

impl FakeTools {
    pub fn for_project(project_dir: &Path) -> Self {
        Self {
            roots: vec![project_dir.join("sources"), project_dir.join("tests")],
            coverage_csv: COVERAGE_HEADER.to_string(),
            ..Self::default()
        }
    }

    /// Invocations of a program, by file name
    pub fn calls(&self, program: &str) -> Vec<&Invocation> {
        self.invocations
            .iter()
            .filter(|i| i.program_name() == program)
            .collect()
    }

    fn value_after(invocation: &Invocation, flag: &str) -> Option<PathBuf> {
        let args = invocation.argument_strings();
        let index = args.iter().position(|a| a == flag)?;
        args.get(index + 1).map(PathBuf::from)
    }

    fn compile(&self, invocation: &Invocation) {
        let Some(output) = Self::value_after(invocation, "-d") else {
            return;
        };
        for arg in invocation.argument_strings() {
            if !arg.ends_with(".java") {
                continue;
            }
            let source = PathBuf::from(&arg);
            let Some(relative) = self.roots.iter().find_map(|r| source.strip_prefix(r).ok()) else {
                continue;
            };
            let class = output.join(relative.with_extension("class"));
            fs::create_dir_all(class.parent().unwrap()).unwrap();
            fs::write(&class, format!("compiled {}", relative.display())).unwrap();
        }
    }

    /// Paths resolve against the working directory, the way `jar` resolves them
    fn resolve(invocation: &Invocation, path: PathBuf) -> PathBuf {
        match invocation.working_dir() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    /// Exit code 1 when the `-C` classes folder doesn't exist
    fn archive(&self, invocation: &Invocation) -> i32 {
        let args = invocation.argument_strings();
        let classes = Self::value_after(invocation, "-C").map(|c| Self::resolve(invocation, c));
        if !classes.is_some_and(|c| c.is_dir()) {
            return 1;
        }
        let artifact = Self::resolve(invocation, PathBuf::from(&args[1]));
        fs::write(artifact, format!("archive {}", args[0])).unwrap();
        0
    }
}

impl ToolRunner for FakeTools {
    fn run(&mut self, invocation: &Invocation) -> BuildResult<i32> {
        self.invocations.push(invocation.clone());
        let code = match invocation.program_name().as_str() {
            "javac" => {
                if self.javac_exit == 0 {
                    self.compile(invocation);
                }
                self.javac_exit
            }
            "jar" => {
                if self.jar_exit == 0 {
                    self.archive(invocation)
                } else {
                    self.jar_exit
                }
            }
            "java" if invocation.argument_strings().first().map(String::as_str) == Some("-jar") => {
                if let Some(csv) = Self::value_after(invocation, "--csv") {
                    fs::write(csv, &self.coverage_csv).unwrap();
                }
                self.report_exit
            }
            "java" => self.harness_exit,
            other => panic!("unexpected tool {}", other),
        };
        Ok(code)
    }
}

pub fn an_hour_ago() -> SystemTime {
    SystemTime::now() - Duration::from_secs(3600)
}

/// Scratch project with the given manifest
pub fn project(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("project.json"), manifest).unwrap();
    dir
}

/// Write a source file dated an hour ago
pub fn write_source(project_dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = project_dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    set_modified(&path, an_hour_ago());
    path
}

pub fn set_modified(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub fn config(store_root: &Path) -> PipelineConfig {
    PipelineConfig {
        store_root: store_root.to_path_buf(),
        toolchain: Toolchain {
            jacoco_agent: Some(PathBuf::from("/opt/jacoco/jacocoagent.jar")),
            jacoco_cli: Some(PathBuf::from("/opt/jacoco/jacococli.jar")),
            ..Toolchain::default()
        },
        open_coverage_report: false,
    }
}

pub fn pipeline(project_dir: &Path, store_root: &Path, tools: FakeTools) -> Pipeline<FakeTools> {
    Pipeline::load(project_dir, config(store_root), tools).unwrap()
}

/// Every file under a folder with its bytes and modification time
pub fn snapshot(folder: &Path) -> BTreeMap<PathBuf, (Vec<u8>, SystemTime)> {
    walkdir::WalkDir::new(folder)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let bytes = fs::read(e.path()).unwrap();
            let modified = e.metadata().unwrap().modified().unwrap();
            (e.path().to_path_buf(), (bytes, modified))
        })
        .collect()
}
