use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

mod commands;
mod config;

/// Build, test and install Java projects described by project.json.
///
/// EXAMPLES:
///     kiln build                       Compile sources and package the artifact
///     kiln test --coverage             Build, run tests and check line coverage
///     kiln test --pattern='*Widget*'   Run matching tests only
///     kiln install                     Test, then publish into the package store
///
/// ENVIRONMENT VARIABLES:
///     KILN_HOME      Package store root (default: ~/.kiln/store)
///     KILN_JSON      Set to '1' for a JSON summary by default
///     KILN_LOG       Log filter, e.g. 'debug' (default: warn)
///     NO_COLOR       Set to disable colored output
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing project.json
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Print a JSON summary of every stage
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile sources, package the artifact and compile tests
    ///
    /// EXAMPLES:
    ///     kiln build            Incremental build
    ///     kiln build --debug    Echo every tool command line
    #[command(visible_alias = "b")]
    Build {
        /// Echo tool command lines before running them
        #[arg(long)]
        debug: bool,
    },

    /// Build, then run the test harness
    ///
    /// EXAMPLES:
    ///     kiln test                        Run every test class
    ///     kiln test --pattern='*Widget*'   Pass a name pattern to the harness
    ///     kiln test --coverage             Instrument and gate on line coverage
    #[command(visible_alias = "t")]
    Test {
        #[command(flatten)]
        options: TestArgs,
    },

    /// Build and test, then publish into the package store
    ///
    /// Copies the artifact and project.json to
    /// <store>/<publisher>/<project>/<version>/ and writes a launcher
    /// script when a main class is configured.
    Install {
        #[command(flatten)]
        options: TestArgs,
    },
}

#[derive(clap::Args)]
struct TestArgs {
    /// Echo tool command lines before running them
    #[arg(long)]
    debug: bool,
    /// Only run tests matching this pattern
    #[arg(long)]
    pattern: Option<String>,
    /// Collect coverage and check the configured line coverage minimum
    #[arg(long)]
    coverage: bool,
    /// Don't open the HTML coverage report
    #[arg(long)]
    no_open: bool,
}

/// Options that older scripts spell with a single dash
const LEGACY_FLAGS: [&str; 4] = ["debug", "coverage", "pattern", "no-open"];

/// Rewrite `-debug`, `-coverage` and `-pattern=x` to their double-dash forms
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(flag) = text.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
                return arg;
            };
            let name = flag.split('=').next().unwrap_or(flag);
            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("KILN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let cli_config = config::Config::from_env();
    if cli_config.no_color {
        colored::control::set_override(false);
    }

    let json = cli.json || cli_config.default_json;

    match cli.command {
        Commands::Build { debug } => {
            let args = commands::CommandArgs {
                project_dir: cli.project_dir,
                debug,
                json,
                open_report: false,
            };
            commands::build::run(&args)?;
        }
        Commands::Test { options } => {
            let (args, test) = split(cli.project_dir, json, options);
            commands::test::run(&args, &test)?;
        }
        Commands::Install { options } => {
            let (args, test) = split(cli.project_dir, json, options);
            commands::install::run(&args, &test)?;
        }
    }

    Ok(())
}

fn split(
    project_dir: PathBuf,
    json: bool,
    options: TestArgs,
) -> (commands::CommandArgs, kiln_build::TestOptions) {
    let args = commands::CommandArgs {
        project_dir,
        debug: options.debug,
        json,
        open_report: !options.no_open,
    };
    let test = kiln_build::TestOptions {
        pattern: options.pattern,
        coverage: options.coverage,
    };
    (args, test)
}
