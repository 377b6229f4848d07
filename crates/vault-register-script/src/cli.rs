//! Command-line argument definitions.
//!
//! Build recipes invoke the tool with Go-style single-dash long flags
//! (`-vault /path/to/vault`). `clap` reserves a single dash for short flags, so
//! [`normalise_long_flags`] rewrites the recognised single-dash spellings to
//! their double-dash form before parsing.
//!
//! As with Go's `flag` package, flag parsing stops at the first positional
//! argument. It and everything after it are collected and ignored.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};

/// Executable written at the start of every command when `--vault` is absent.
pub const DEFAULT_VAULT_EXECUTABLE: &str = "vault";
/// Diagnostics filter used when `--log-filter` is absent.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Long flags accepted with a single leading dash, and whether each one
/// consumes a value.
const LONG_FLAGS: &[(&str, bool)] = &[
    ("vault", true),
    ("log-filter", true),
    ("log-format", true),
    ("help", false),
    ("version", false),
];

/// Diagnostic output formats.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
}

/// Command-line interface for `make-register-script`.
#[derive(Parser, Debug)]
#[command(
    name = "make-register-script",
    version,
    about = "Prints `vault plugin register` commands for the plugins in $pluginsPath, \
             hashing each binary under $out/bin."
)]
pub(crate) struct Cli {
    /// Path to the Vault executable named at the start of each command.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_VAULT_EXECUTABLE)]
    pub(crate) vault: OsString,
    /// Tracing filter directive for diagnostics written to stderr.
    #[arg(long, value_name = "FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Format of diagnostics written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
    /// Arguments after the last flag; accepted and ignored.
    #[arg(hide = true, trailing_var_arg = true)]
    pub(crate) operands: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Rewrite { needs_value: bool },
    Keep,
    EndOfFlags,
}

fn classify(argument: &str) -> FlagAction {
    if argument == "--" || argument == "-" {
        return FlagAction::EndOfFlags;
    }
    let Some(body) = argument.strip_prefix('-') else {
        return FlagAction::EndOfFlags;
    };
    if body.starts_with('-') {
        return FlagAction::Keep;
    }

    let mut flag_parts = body.splitn(2, '=');
    let name = flag_parts.next().unwrap_or_default();
    let has_inline_value = flag_parts.next().is_some();

    LONG_FLAGS
        .iter()
        .find(|(flag, _)| *flag == name)
        .map_or(FlagAction::Keep, |&(_, takes_value)| FlagAction::Rewrite {
            needs_value: takes_value && !has_inline_value,
        })
}

/// Rewrites `-vault`-style flags to `--vault` so `clap` accepts them.
///
/// The program name, separated flag values, and everything from `--` or the
/// first positional argument onwards are passed through untouched.
pub(crate) fn normalise_long_flags(args: Vec<OsString>) -> Vec<OsString> {
    let mut normalised = Vec::with_capacity(args.len());
    let mut arguments = args.into_iter();
    normalised.extend(arguments.next());

    let mut pending_value = false;
    let mut end_of_flags = false;
    for argument in arguments {
        if pending_value || end_of_flags {
            pending_value = false;
            normalised.push(argument);
            continue;
        }

        let action = classify(&argument.to_string_lossy());
        match action {
            FlagAction::Rewrite { needs_value } => {
                let mut rewritten = OsString::from("-");
                rewritten.push(&argument);
                normalised.push(rewritten);
                pending_value = needs_value;
            }
            FlagAction::Keep => normalised.push(argument),
            FlagAction::EndOfFlags => {
                end_of_flags = true;
                normalised.push(argument);
            }
        }
    }
    normalised
}
