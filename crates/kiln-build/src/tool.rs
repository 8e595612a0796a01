//! External tool execution
//!
//! The compiler, archiver, test harness and coverage tool are all driven
//! through [`ToolRunner`]: build an [`Invocation`], run it, get the exit code.

use crate::error::{BuildError, BuildResult};
use crate::relay::{Latch, LeadingNewlineWriter};
use std::ffi::{OsStr, OsString};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A single external tool command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// File name of the program, e.g. `javac` for `/jdk/bin/javac`
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy UTF-8 strings
    pub fn argument_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Printable command line; arguments with spaces are quoted
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.argument_strings())
            .map(|part| {
                if part.contains(' ') {
                    format!("\"{}\"", part)
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external tools and reports their exit codes
pub trait ToolRunner {
    fn run(&mut self, invocation: &Invocation) -> BuildResult<i32>;
}

/// Runs tools as child processes, relaying their output to our stdout/stderr
#[derive(Debug, Default)]
pub struct ProcessRunner {
    /// Print each command line before running it
    echo_commands: bool,
    /// Send tool stdout and echoed command lines to stderr
    stdout_to_stderr: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo command lines verbatim before execution
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }

    /// Keep our stdout free of tool output, e.g. when it carries a JSON summary
    pub fn with_stdout_to_stderr(mut self, redirect: bool) -> Self {
        self.stdout_to_stderr = redirect;
        self
    }

    fn stdout_sink(&self) -> Box<dyn Write + Send> {
        if self.stdout_to_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> BuildResult<i32> {
        let command_line = invocation.command_line();
        if self.echo_commands {
            writeln!(self.stdout_sink(), "{}", command_line)?;
        }
        tracing::debug!(command = %command_line, "running tool");

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = invocation.working_dir() {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| BuildError::tool_spawn(invocation.program_name(), e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let latch = Latch::new();

        // Drain both pipes while waiting so a chatty tool can't fill a buffer and stall
        let status = std::thread::scope(|scope| {
            if let Some(stdout) = stdout {
                let writer = LeadingNewlineWriter::sharing(self.stdout_sink(), latch.clone());
                scope.spawn(move || relay(stdout, writer));
            }
            if let Some(stderr) = stderr {
                let writer = LeadingNewlineWriter::sharing(io::stderr(), latch.clone());
                scope.spawn(move || relay(stderr, writer));
            }
            child.wait()
        })
        .map_err(|e| BuildError::tool_spawn(invocation.program_name(), e))?;

        let code = status.code().unwrap_or(-1);
        tracing::debug!(program = %invocation.program_name(), code, "tool exited");
        Ok(code)
    }
}

fn relay(mut reader: impl Read, mut writer: impl Write) {
    if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.flush()) {
        tracing::warn!(error = %e, "failed to relay tool output");
    }
}
