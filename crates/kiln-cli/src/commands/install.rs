//! Install command - test, then publish into the package store

use super::{finish, open_pipeline, progress, CommandArgs};
use anyhow::Result;
use kiln_build::TestOptions;

/// Run the install command
pub fn run(args: &CommandArgs, options: &TestOptions) -> Result<()> {
    let mut pipeline = open_pipeline(args)?;
    let mut out = progress(args);
    let outcome = pipeline.install(options, &mut out)?;
    finish("Install", &outcome, args.json)
}
