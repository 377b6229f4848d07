//! Formatting and writing of `vault plugin register` commands.
//!
//! Each plugin produces exactly one line:
//!
//! ```text
//! '<vault>' plugin register -sha256=<hex> -command='<name>' [-version='<v>' ]'<type>' '<pname>'
//! ```
//!
//! Lines are rendered into a reusable buffer and written whole, so a reader
//! never observes a partial command. Processing stops at the first plugin
//! whose binary cannot be hashed or whose line cannot be written; lines
//! already written are left in place.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::digest::{DigestError, sha256_file};
use crate::manifest::PluginDescriptor;
use crate::shell::push_escaped;

/// Errors raised while emitting registration commands.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A plugin binary could not be hashed.
    #[error(transparent)]
    Digest(#[from] DigestError),
    /// A command line could not be written, for example because the reader
    /// closed the pipe.
    #[error("failed to write registration command: {0}")]
    Write(#[source] io::Error),
}

/// Writes one registration command per plugin.
#[derive(Debug)]
pub struct CommandEmitter<'a> {
    vault_executable: &'a OsStr,
    output_dir: &'a Path,
    line: Vec<u8>,
}

impl<'a> CommandEmitter<'a> {
    /// Creates an emitter for the executable and output root in `config`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self::with_parts(config.vault_executable(), config.output_dir())
    }

    /// Creates an emitter from its individual inputs.
    #[must_use]
    pub const fn with_parts(vault_executable: &'a OsStr, output_dir: &'a Path) -> Self {
        Self {
            vault_executable,
            output_dir,
            line: Vec::new(),
        }
    }

    /// Hashes each plugin binary and writes its command to `out`, in order.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Digest`] for the first binary that cannot be
    /// hashed and [`EmitError::Write`] if `out` rejects a line.
    pub fn emit<W>(&mut self, plugins: &[PluginDescriptor], out: &mut W) -> Result<usize, EmitError>
    where
        W: Write + ?Sized,
    {
        let mut written = 0;
        for plugin in plugins {
            let binary = plugin.binary_path(self.output_dir);
            let digest = sha256_file(&binary)?;
            debug!(binary = %binary.display(), %digest, "hashed plugin binary");

            self.render(plugin, &digest);
            out.write_all(&self.line).map_err(EmitError::Write)?;
            out.flush().map_err(EmitError::Write)?;
            written += 1;
        }
        Ok(written)
    }

    /// Renders the command for `plugin` with a precomputed `digest`.
    pub fn render(&mut self, plugin: &PluginDescriptor, digest: &str) -> &[u8] {
        let line = &mut self.line;
        line.clear();
        push_escaped(line, self.vault_executable.as_encoded_bytes());
        line.extend_from_slice(b" plugin register -sha256=");
        line.extend_from_slice(digest.as_bytes());
        line.extend_from_slice(b" -command=");
        push_escaped(line, plugin.command_name().as_bytes());
        if let Some(version) = plugin.non_empty_version() {
            line.extend_from_slice(b" -version=");
            push_escaped(line, version.as_bytes());
        }
        line.push(b' ');
        push_escaped(line, plugin.kind().as_bytes());
        line.push(b' ');
        push_escaped(line, plugin.program_name().as_bytes());
        line.push(b'\n');
        &self.line
    }
}
