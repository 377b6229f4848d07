//! Runtime configuration for the generator.
//!
//! Build environments pass their inputs through environment variables: `out`
//! names the output root and `pluginsPath` the manifest. Those variables are
//! read exactly once, through an [`Environment`], and folded together with the
//! parsed flags into a [`Config`] that every other component receives
//! explicitly.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::hash::BuildHasher;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cli::{Cli, DEFAULT_LOG_FILTER, DEFAULT_VAULT_EXECUTABLE, LogFormat};

/// Environment variable holding the build output root.
pub const OUTPUT_DIR_VAR: &str = "out";
/// Environment variable holding the manifest path.
pub const MANIFEST_PATH_VAR: &str = "pluginsPath";

/// Source of environment variables.
pub trait Environment {
    /// Returns the value of `name`, if set.
    fn var_os(&self, name: &str) -> Option<OsString>;
}

/// Reads variables from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

impl<S: BuildHasher> Environment for HashMap<String, OsString, S> {
    fn var_os(&self, name: &str) -> Option<OsString> {
        self.get(name).cloned()
    }
}

/// Errors raised while resolving configuration inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `$out` is unset or empty.
    #[error("$out not set")]
    OutputPathNotSet,
    /// `$pluginsPath` is unset or empty.
    #[error("$pluginsPath not set")]
    ManifestPathNotSet,
    /// The manifest file could not be read.
    #[error("failed to read plugin manifest {}: {source}", path.display())]
    ReadManifest {
        /// Manifest path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Resolved inputs for one generator run.
///
/// # Example
///
/// ```
/// use vault_register_script::Config;
///
/// let config = Config::new("/out", "/build/plugins.json").with_vault_executable("/bin/vault");
/// assert_eq!(config.output_dir(), std::path::Path::new("/out"));
/// assert_eq!(config.vault_executable(), "/bin/vault");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    vault_executable: OsString,
    output_dir: PathBuf,
    manifest_path: PathBuf,
    log_filter: String,
    log_format: LogFormat,
}

impl Config {
    /// Creates a configuration with the default executable and diagnostics.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_executable: OsString::from(DEFAULT_VAULT_EXECUTABLE),
            output_dir: output_dir.into(),
            manifest_path: manifest_path.into(),
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
        }
    }

    /// Overrides the Vault executable written at the start of each command.
    #[must_use]
    pub fn with_vault_executable(mut self, vault_executable: impl Into<OsString>) -> Self {
        self.vault_executable = vault_executable.into();
        self
    }

    /// Overrides the diagnostics filter.
    #[must_use]
    pub fn with_log_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }

    /// Overrides the diagnostics format.
    #[must_use]
    pub const fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// Combines parsed flags with the required environment variables.
    pub(crate) fn from_sources<V>(cli: Cli, environment: &V) -> Result<Self, ConfigError>
    where
        V: Environment + ?Sized,
    {
        let output_dir = required_path(environment, OUTPUT_DIR_VAR)
            .ok_or(ConfigError::OutputPathNotSet)?;
        let manifest_path = required_path(environment, MANIFEST_PATH_VAR)
            .ok_or(ConfigError::ManifestPathNotSet)?;
        Ok(Self::new(output_dir, manifest_path)
            .with_vault_executable(cli.vault)
            .with_log_filter(cli.log_filter)
            .with_log_format(cli.log_format))
    }

    /// Reads the manifest file in full.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadManifest`] if the file cannot be read.
    pub fn read_manifest(&self) -> Result<Vec<u8>, ConfigError> {
        std::fs::read(&self.manifest_path).map_err(|source| ConfigError::ReadManifest {
            path: self.manifest_path.clone(),
            source,
        })
    }

    /// Returns the Vault executable.
    #[must_use]
    pub fn vault_executable(&self) -> &OsStr {
        &self.vault_executable
    }

    /// Returns the build output root.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the manifest path.
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Returns the diagnostics filter directive.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the diagnostics format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn required_path<V>(environment: &V, name: &str) -> Option<PathBuf>
where
    V: Environment + ?Sized,
{
    environment
        .var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
