#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgcruft
//!
//! This crate builds the single immutable [`Config`] used for a run from:
//! - Default values (hard-coded)
//! - An optional TOML file named by `PKGCRUFT_CONFIG`
//! - Environment variables (`PREFIX`, `CONCURRENCY`, `IGNORE_UNPACKAGED`,
//!   `IGNORE_LDD`)

pub mod constants;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use pkgcruft_errors::{ConfigError, Error};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use constants::{DEFAULT_CONCURRENCY, DEFAULT_PREFIX, MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the package-managed tree
    pub prefix: PathBuf,
    /// Concurrent `ldd` invocations for `libcheck`
    pub concurrency: usize,
    /// Globs, relative to `prefix`, excluded from `files` and `dirs`
    pub ignore_unpackaged: Vec<String>,
    /// Globs, relative to `prefix`, never handed to `ldd`
    pub ignore_ldd: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from(DEFAULT_PREFIX),
            concurrency: DEFAULT_CONCURRENCY,
            ignore_unpackaged: Vec::new(),
            ignore_ldd: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration with the full precedence chain
    ///
    /// # Errors
    ///
    /// Returns an error if the config file named by `PKGCRUFT_CONFIG` cannot
    /// be read or parsed, or if any setting is invalid.
    pub fn load() -> Result<Self, Error> {
        let mut config = match std::env::var_os(constants::CONFIG_FILE_ENV) {
            Some(path) => Self::load_from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.merge_env()?;
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Merge settings from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns an error if `CONCURRENCY` is not an integer.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("PREFIX") {
            self.prefix = PathBuf::from(prefix);
        }

        if let Some(concurrency) = lookup("CONCURRENCY") {
            self.concurrency =
                concurrency
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "CONCURRENCY".to_string(),
                        value: concurrency,
                    })?;
        }

        if let Some(globs) = lookup("IGNORE_UNPACKAGED") {
            self.ignore_unpackaged = split_glob_list(&globs);
        }

        if let Some(globs) = lookup("IGNORE_LDD") {
            self.ignore_ldd = split_glob_list(&globs);
        }

        Ok(())
    }

    /// Check ranges and compile every glob once
    ///
    /// # Errors
    ///
    /// Returns an error for a relative prefix, a concurrency outside 1–32,
    /// or a glob that does not compile.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.prefix.is_absolute() {
            return Err(ConfigError::InvalidValue {
                field: "PREFIX".to_string(),
                value: self.prefix.display().to_string(),
            }
            .into());
        }

        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidValue {
                field: "CONCURRENCY".to_string(),
                value: self.concurrency.to_string(),
            }
            .into());
        }

        self.ignore_unpackaged_set()?;
        self.ignore_ldd_set()?;
        Ok(())
    }

    /// Compiled `IGNORE_UNPACKAGED` globs, anchored at the prefix
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn ignore_unpackaged_set(&self) -> Result<GlobSet, Error> {
        compile_globs(&self.prefix, &self.ignore_unpackaged)
    }

    /// Compiled `IGNORE_LDD` globs, anchored at the prefix
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn ignore_ldd_set(&self) -> Result<GlobSet, Error> {
        compile_globs(&self.prefix, &self.ignore_ldd)
    }
}

fn split_glob_list(value: &str) -> Vec<String> {
    value
        .split(':')
        .map(str::trim)
        .filter(|glob| !glob.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Build a glob set from prefix-relative patterns
///
/// `*` does not cross directory separators; use `**` for that.
///
/// # Errors
///
/// Returns an error if a pattern is not a valid glob.
pub fn compile_globs(prefix: &Path, patterns: &[String]) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let anchored = prefix.join(pattern.trim_start_matches('/'));
        let glob = GlobBuilder::new(&anchored.to_string_lossy())
            .literal_separator(true)
            .build()
            .map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        ConfigError::InvalidGlob {
            pattern: patterns.join(":"),
            message: e.to_string(),
        }
        .into()
    })
}
