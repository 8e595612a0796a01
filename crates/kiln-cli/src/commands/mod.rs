//! Subcommand implementations
//!
//! Every command loads the global configuration, builds a pipeline over the
//! project directory and reports the outcome the same way.

pub mod build;
pub mod install;

use anyhow::{bail, Context, Result};
use colored::*;
use kiln_build::{Pipeline, PipelineConfig, PipelineOutcome, ProcessRunner, StageStatus, Toolchain};
use kiln_config::GlobalConfig;
use std::io::{self, Write};
use std::path::PathBuf;

/// Arguments shared by every command
#[derive(Debug, Clone)]
pub struct CommandArgs {
    /// Project directory (defaults to current)
    pub project_dir: PathBuf,
    /// Echo tool command lines
    pub debug: bool,
    /// JSON summary on stdout; progress goes to stderr
    pub json: bool,
    /// Open the HTML coverage report when one is written
    pub open_report: bool,
}

/// Load the global configuration and the project manifest
pub fn open_pipeline(args: &CommandArgs) -> Result<Pipeline<ProcessRunner>> {
    let global = GlobalConfig::load().context("Failed to load ~/.kiln/config.toml")?;
    let store_root = global
        .store_root()
        .context("Failed to locate the package store")?;
    tracing::debug!(store = %store_root.display(), "package store");

    let config = PipelineConfig {
        store_root,
        toolchain: Toolchain::from_config(&global.tools()),
        open_coverage_report: args.open_report && !args.json,
    };
    let runner = ProcessRunner::new()
        .with_echo(args.debug)
        .with_stdout_to_stderr(args.json);

    Pipeline::load(&args.project_dir, config, runner).with_context(|| {
        format!(
            "Failed to load project from {}",
            args.project_dir.display()
        )
    })
}

/// Where progress text goes: stdout normally, stderr under `--json`
pub fn progress(args: &CommandArgs) -> Box<dyn Write> {
    if args.json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    }
}

/// Print the summary and turn a failed outcome into an error
pub fn finish(operation: &str, outcome: &PipelineOutcome, json: bool) -> Result<()> {
    if json {
        let summary = serde_json::json!({
            "operation": operation,
            "succeeded": outcome.succeeded,
            "stages": outcome.stages,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if outcome.succeeded {
        println!("{} {}", operation, "succeeded".green().bold());
    } else {
        println!("{} {}", operation, "FAILED".red().bold());
    }

    if let Some(failure) = outcome.failure() {
        if let StageStatus::Failed { reason } = &failure.status {
            bail!("{} failed at {}: {}", operation, failure.stage.name(), reason);
        }
    }
    Ok(())
}
