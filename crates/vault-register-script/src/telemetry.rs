//! Diagnostic logging for the generator.
//!
//! Diagnostics go to stderr so they never mix with the generated script on
//! stdout. The default filter is `warn`, which keeps a successful run silent.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, debug};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogFormat;
use crate::config::Config;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
}

/// Installs the global tracing subscriber on first use.
///
/// The filter is validated on every call; only the first call installs a
/// subscriber, later calls leave the existing one in place. An existing
/// global subscriber installed by someone else is left untouched.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    TELEMETRY_GUARD.get_or_init(|| install_subscriber(filter, config.log_format()));
    Ok(())
}

fn install_subscriber(filter: EnvFilter, format: LogFormat) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        // Keep colour codes out of build logs.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        debug!(%error, "keeping the host's tracing subscriber");
    }
}
