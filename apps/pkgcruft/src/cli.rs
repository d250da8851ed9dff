//! Command line interface definition

use clap::{Parser, Subcommand};

/// pkgcruft - find cruft left behind by the package manager
#[derive(Parser)]
#[command(name = "pkgcruft")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find cruft left behind by the package manager")]
#[command(
    long_about = "Find cruft left behind by the package manager.\n\n\
    Settings come from the environment: PREFIX (default /usr/local), \
    CONCURRENCY (1-32, default 16), IGNORE_UNPACKAGED and IGNORE_LDD \
    (colon-separated globs relative to PREFIX). PKGCRUFT_CONFIG may name \
    a TOML file with the same settings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List processes running code that was replaced or deleted on disk
    Checkrestart,

    /// List packaged binaries with missing, private, compat, unpackaged or
    /// defunct library dependencies
    Libcheck,

    /// List files under PREFIX that no package owns
    Files,

    /// List directories under PREFIX that hold no packaged file
    Dirs,

    /// List installed packages no repository offers any more
    Defunct,
}

impl Commands {
    /// Name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Checkrestart => "checkrestart",
            Self::Libcheck => "libcheck",
            Self::Files => "files",
            Self::Dirs => "dirs",
            Self::Defunct => "defunct",
        }
    }
}
