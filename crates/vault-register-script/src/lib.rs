//! Generator for `vault plugin register` scripts.
//!
//! A package build installs Vault plugin binaries under `$out/bin` and
//! describes them in a JSON manifest named by `$pluginsPath`. This crate reads
//! that manifest, hashes every binary with SHA-256, and prints one shell-safe
//! registration command per plugin:
//!
//! ```text
//! 'vault' plugin register -sha256=<hex> -command='foo-1.0.0' -version='1.0.0' 'secret' 'foo'
//! ```
//!
//! The tool never runs Vault itself; the output is meant to be reviewed or
//! piped into a shell. Any failure stops the run with a single message on
//! stderr and a non-zero exit status.
//!
//! [`run`] drives the whole pipeline against the process environment.
//! [`run_with_environment`] accepts any [`Environment`] so tests and embedding
//! callers can supply inputs without touching process state.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

mod cli;
mod config;
mod digest;
mod emit;
mod errors;
mod manifest;
mod pipe;
mod shell;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::cli::{DEFAULT_LOG_FILTER, DEFAULT_VAULT_EXECUTABLE, LogFormat};
pub use self::config::{
    Config, ConfigError, Environment, MANIFEST_PATH_VAR, OUTPUT_DIR_VAR, ProcessEnvironment,
};
pub use self::digest::{DigestError, sha256_file, sha256_reader};
pub use self::emit::{CommandEmitter, EmitError};
pub use self::manifest::{BIN_DIR, ManifestError, PluginDescriptor, parse_manifest};
pub use self::pipe::{PipeError, tolerate_closed_pipe};
pub use self::shell::{escape_shell_arg, escape_shell_arg_bytes};

use self::cli::{Cli, normalise_long_flags};
use self::errors::AppError;

/// Runs the generator against the process environment.
///
/// Registration commands are written to `stdout`; a single error message is
/// written to `stderr` on failure.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_environment(args, &ProcessEnvironment, stdout, stderr)
}

/// Runs the generator, reading `out` and `pluginsPath` from `environment`.
#[must_use]
pub fn run_with_environment<I, V, W, E>(
    args: I,
    environment: &V,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    V: Environment + ?Sized,
    W: Write,
    E: Write,
{
    let args = normalise_long_flags(args.into_iter().collect());
    let result = Cli::try_parse_from(args)
        .map_err(AppError::CliUsage)
        .and_then(|cli| generate(cli, environment, stdout));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) => report_usage(&error, stdout, stderr),
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

/// Prints clap output; `--help` and `--version` arrive as errors that belong
/// on stdout and succeed.
fn report_usage<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if error.use_stderr() {
        let _ = write!(stderr, "{rendered}");
        return ExitCode::FAILURE;
    }
    match write!(stdout, "{rendered}").and_then(|()| stdout.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn generate<V, W>(cli: Cli, environment: &V, stdout: &mut W) -> Result<usize, AppError>
where
    V: Environment + ?Sized,
    W: Write,
{
    let ignored_operands = cli.operands.len();
    let config = Config::from_sources(cli, environment)?;
    telemetry::initialise(&config)?;
    debug!(
        output_dir = %config.output_dir().display(),
        manifest = %config.manifest_path().display(),
        ignored_operands,
        "configuration resolved"
    );

    let manifest = config.read_manifest()?;
    let plugins = parse_manifest(&manifest)?;
    debug!(plugins = plugins.len(), "manifest parsed");

    tolerate_closed_pipe()?;
    let written = CommandEmitter::new(&config).emit(&plugins, stdout)?;
    info!(written, "registration commands emitted");
    Ok(written)
}
