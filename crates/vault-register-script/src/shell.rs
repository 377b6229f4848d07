//! POSIX shell quoting for arguments embedded in the generated script.
//!
//! Every argument is wrapped in single quotes. A literal single quote cannot
//! appear inside a single-quoted word, so each one closes the quoting, emits
//! an escaped quote, and reopens it (`'\''`). A POSIX shell reading the result
//! recovers the original bytes exactly, whatever they contain.

const SINGLE_QUOTE_REPLACEMENT: &[u8] = b"'\\''";

/// Quotes `arg` so a POSIX shell interprets it as a single literal word.
///
/// # Examples
///
/// ```
/// use vault_register_script::escape_shell_arg;
///
/// assert_eq!(escape_shell_arg("vault"), "'vault'");
/// assert_eq!(escape_shell_arg("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn escape_shell_arg(arg: &str) -> String {
    let mut escaped = String::with_capacity(escaped_len(arg.as_bytes()));
    escaped.push('\'');
    for ch in arg.chars() {
        if ch == '\'' {
            escaped.push_str(r"'\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Byte-oriented variant of [`escape_shell_arg`] for arguments that need not
/// be valid UTF-8, such as executable paths taken from the command line.
#[must_use]
pub fn escape_shell_arg_bytes(arg: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(escaped_len(arg));
    push_escaped(&mut escaped, arg);
    escaped
}

/// Appends the quoted form of `arg` to `buffer`.
pub(crate) fn push_escaped(buffer: &mut Vec<u8>, arg: &[u8]) {
    buffer.reserve(escaped_len(arg));
    buffer.push(b'\'');
    for &byte in arg {
        if byte == b'\'' {
            buffer.extend_from_slice(SINGLE_QUOTE_REPLACEMENT);
        } else {
            buffer.push(byte);
        }
    }
    buffer.push(b'\'');
}

fn escaped_len(arg: &[u8]) -> usize {
    let quotes = arg.iter().filter(|&&byte| byte == b'\'').count();
    2 + arg.len() + SINGLE_QUOTE_REPLACEMENT.len() * quotes
}
