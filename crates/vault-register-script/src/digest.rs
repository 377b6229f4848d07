//! SHA-256 digests of plugin binaries.
//!
//! Files are streamed through the hasher with [`io::copy`], so binaries of any
//! size are hashed without being loaded into memory. The file handle is owned
//! by the hashing call and closed when it returns, on success or failure.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while hashing a plugin binary.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The binary could not be opened.
    #[error("failed to open plugin binary {}: {source}", path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The binary was opened but reading it failed.
    #[error("failed to read plugin binary {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl DigestError {
    /// Returns the path of the binary that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => path,
        }
    }
}

/// Hashes the file at `path`, returning the lowercase hex SHA-256 digest.
///
/// # Errors
///
/// Returns [`DigestError::Open`] when the file cannot be opened and
/// [`DigestError::Read`] when reading it fails part way.
pub fn sha256_file(path: &Path) -> Result<String, DigestError> {
    let file = File::open(path).map_err(|source| DigestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    sha256_reader(file).map_err(|source| DigestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Hashes everything `reader` yields, returning the lowercase hex digest.
///
/// # Errors
///
/// Propagates any error returned by `reader`.
///
/// # Examples
///
/// ```
/// use vault_register_script::sha256_reader;
///
/// let digest = sha256_reader(&b"abc"[..]).expect("in-memory read");
/// assert_eq!(
///     digest,
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn sha256_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
