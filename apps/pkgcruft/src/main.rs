//! pkgcruft - find cruft left behind by the package manager
//!
//! Runs exactly one check per invocation and prints its findings, one per
//! line, on standard output.

mod cli;
mod error;
mod output;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::{write_text, FindingWriter};
use clap::error::ErrorKind;
use clap::Parser;
use pkgcruft_config::Config;
use pkgcruft_guard::{CruftGuard, Finding};
use pkgcruft_platform::FreeBsdPlatform;
use std::process;
use tokio::select;
use tracing::{debug, error};

/// Exit status for a usage error or a failed check
const EXIT_FAILURE: i32 = 1;
/// Exit status after SIGINT
const EXIT_INTERRUPTED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = parse_args();
    init_tracing();

    let code = run(cli.command).await;
    process::exit(code);
}

/// Parse arguments; usage problems go to stdout with status 1
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_FAILURE,
            };
            if let Err(err) = write_text(std::io::stdout().lock(), &e.render().to_string()) {
                eprintln!("pkgcruft: {err}");
            }
            process::exit(code);
        }
    }
}

/// Run the check on a blocking thread, racing it against Ctrl-C
async fn run(command: Commands) -> i32 {
    debug!(command = command.name(), "starting check");
    let check = tokio::task::spawn_blocking(move || execute(command));

    select! {
        joined = check => {
            let result = joined.unwrap_or_else(|e| Err(CliError::Aborted(e.to_string())));
            match result {
                Ok(()) => 0,
                Err(e) if e.is_broken_pipe() => 0,
                Err(e) => {
                    error!(command = command.name(), "check failed: {e}");
                    eprintln!("Error: {e}");
                    EXIT_FAILURE
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("pkgcruft: interrupted");
            EXIT_INTERRUPTED
        }
    }
}

fn execute(command: Commands) -> Result<(), CliError> {
    let config = Config::load()?;
    let platform = FreeBsdPlatform::new();
    let guard = CruftGuard::builder()
        .with_config(config)
        .with_platform(&platform)
        .build()?;

    let mut writer = FindingWriter::new(std::io::stdout().lock());
    let mut sink = |finding: Finding| writer.write(&finding);

    match command {
        Commands::Checkrestart => guard.checkrestart(&mut sink)?,
        Commands::Libcheck => guard.libcheck(&mut sink)?,
        Commands::Files => guard.files(&mut sink)?,
        Commands::Dirs => guard.dirs(&mut sink)?,
        Commands::Defunct => guard.defunct(&mut sink)?,
    }

    let written = writer.finish()?;
    debug!(command = command.name(), findings = written, "check finished");
    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
///
/// `PKGCRUFT_DEBUG` turns on debug output for pkgcruft's own crates.
fn init_tracing() {
    let default_filter = if std::env::var_os("PKGCRUFT_DEBUG").is_some() {
        "warn,pkgcruft=debug,pkgcruft_guard=debug,pkgcruft_index=debug,\
         pkgcruft_resolver=debug,pkgcruft_platform=debug,pkgcruft_resources=debug,\
         pkgcruft_config=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}
