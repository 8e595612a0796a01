//! Build command - compile sources, package the artifact, compile tests

use super::{finish, open_pipeline, progress, CommandArgs};
use anyhow::Result;

/// Run the build command
pub fn run(args: &CommandArgs) -> Result<()> {
    let mut pipeline = open_pipeline(args)?;
    let mut out = progress(args);
    let outcome = pipeline.build(&mut out)?;
    finish("Build", &outcome, args.json)
}
