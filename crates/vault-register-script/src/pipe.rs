//! Treat a closed standard output as an ordinary write error.
//!
//! The generated script is often piped into another process that may exit
//! early (`make-register-script | head -n1`). On Unix the default `SIGPIPE`
//! disposition would kill the process at the next write; ignoring the signal
//! turns that write into an `EPIPE` error that flows through the normal error
//! path. Other platforms already report such writes as errors.

use std::io;

use thiserror::Error;

/// The closed-pipe disposition could not be changed.
#[derive(Debug, Error)]
#[error("failed to ignore SIGPIPE: {0}")]
pub struct PipeError(#[source] pub io::Error);

/// Makes writes to a closed pipe fail with [`io::ErrorKind::BrokenPipe`]
/// instead of terminating the process.
///
/// # Errors
///
/// Returns [`PipeError`] if the platform refuses the change.
#[cfg(unix)]
pub fn tolerate_closed_pipe() -> Result<(), PipeError> {
    use nix::sys::signal::{SigHandler, Signal, signal};

    // SAFETY: `SigIgn` installs no handler code, and nothing else in the
    // process relies on a custom SIGPIPE handler.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }
        .map(|_previous| ())
        .map_err(|errno| PipeError(io::Error::from(errno)))
}

/// Makes writes to a closed pipe fail with [`io::ErrorKind::BrokenPipe`]
/// instead of terminating the process.
///
/// # Errors
///
/// Never fails on this platform.
#[cfg(not(unix))]
pub fn tolerate_closed_pipe() -> Result<(), PipeError> {
    Ok(())
}
