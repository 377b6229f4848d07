//! Top-level error type for a generator run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::emit::EmitError;
use crate::manifest::ManifestError;
use crate::pipe::PipeError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Pipe(#[from] PipeError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}
