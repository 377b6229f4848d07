//! CLI entrypoint for `make-register-script`.
//!
//! The binary delegates to [`vault_register_script::run`] with the process
//! arguments and locked standard streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    vault_register_script::run(std::env::args_os(), &mut stdout, &mut stderr)
}
