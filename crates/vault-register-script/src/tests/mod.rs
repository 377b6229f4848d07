//! Crate-level end-to-end and BDD tests.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{MANIFEST_PATH_VAR, OUTPUT_DIR_VAR, run_with_environment, sha256_reader};


/// Temporary build output with a manifest and plugin binaries.
pub(super) struct BuildOutput {
    dir: TempDir,
    environment: HashMap<String, OsString>,
}

impl BuildOutput {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("out").join("bin")).expect("create bin dir");
        let environment = HashMap::from([
            (
                OUTPUT_DIR_VAR.to_owned(),
                dir.path().join("out").into_os_string(),
            ),
            (
                MANIFEST_PATH_VAR.to_owned(),
                dir.path().join("plugins.json").into_os_string(),
            ),
        ]);
        Self { dir, environment }
    }

    pub(super) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(super) fn write_manifest(&self, json: &str) {
        fs::write(self.root().join("plugins.json"), json).expect("write manifest");
    }

    /// Installs a binary and returns its expected digest.
    pub(super) fn install_binary(&self, command_name: &str, contents: &[u8]) -> String {
        let path = self.root().join("out").join("bin").join(command_name);
        fs::write(path, contents).expect("write binary");
        sha256_reader(contents).expect("hash contents")
    }

    pub(super) fn set_var(&mut self, name: &str, value: impl Into<OsString>) {
        self.environment.insert(name.to_owned(), value.into());
    }

    pub(super) fn remove_var(&mut self, name: &str) {
        self.environment.remove(name);
    }

    pub(super) fn run(&self, args: &[&str]) -> RunOutcome {
        let argv: Vec<OsString> = std::iter::once("make-register-script")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run_with_environment(argv, &self.environment, &mut stdout, &mut stderr);
        RunOutcome {
            exit,
            stdout: String::from_utf8(stdout).expect("stdout utf8"),
            stderr: String::from_utf8(stderr).expect("stderr utf8"),
        }
    }
}

/// Captured result of one in-process run.
#[derive(Debug)]
pub(super) struct RunOutcome {
    pub(super) exit: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

#[fixture]
fn build() -> BuildOutput {
    BuildOutput::new()
}

#[rstest]
fn versioned_plugin_is_registered(build: BuildOutput) {
    let digest = build.install_binary("foo-1.0.0", b"known bytes");
    build.write_manifest(r#"[{"type":"secret","pname":"foo","version":"1.0.0"}]"#);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        format!(
            "'vault' plugin register -sha256={digest} -command='foo-1.0.0' -version='1.0.0' 'secret' 'foo'\n"
        )
    );
    assert!(outcome.stderr.is_empty(), "stderr: {}", outcome.stderr);
}

#[rstest]
fn unversioned_plugin_has_no_version_fragment(build: BuildOutput) {
    let digest = build.install_binary("foo", b"plain");
    build.write_manifest(r#"[{"type":"auth","pname":"foo","version":""}]"#);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert_eq!(
        outcome.stdout,
        format!("'vault' plugin register -sha256={digest} -command='foo' 'auth' 'foo'\n")
    );
}

#[rstest]
#[case::go_style(&["-vault", "/opt/vault/bin/vault"])]
#[case::go_style_inline(&["-vault=/opt/vault/bin/vault"])]
#[case::gnu_style(&["--vault", "/opt/vault/bin/vault"])]
fn vault_flag_replaces_executable(build: BuildOutput, #[case] args: &[&str]) {
    build.install_binary("foo", b"plain");
    build.write_manifest(r#"[{"type":"auth","pname":"foo"}]"#);

    let outcome = build.run(args);

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert!(
        outcome
            .stdout
            .starts_with("'/opt/vault/bin/vault' plugin register "),
        "stdout: {}",
        outcome.stdout
    );
}

#[rstest]
#[case::empty_array("[]")]
#[case::null("null")]
fn empty_manifest_succeeds_silently(build: BuildOutput, #[case] manifest: &str) {
    build.write_manifest(manifest);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.is_empty());
}

#[rstest]
fn output_order_follows_manifest(build: BuildOutput) {
    let names = ["delta", "alpha", "charlie", "bravo"];
    let entries: Vec<String> = names
        .iter()
        .map(|name| {
            build.install_binary(name, name.as_bytes());
            format!(r#"{{"type":"secret","pname":"{name}"}}"#)
        })
        .collect();
    build.write_manifest(&format!("[{}]", entries.join(",")));

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    let emitted: Vec<&str> = outcome
        .stdout
        .lines()
        .map(|line| line.rsplit(' ').next().expect("program name"))
        .collect();
    assert_eq!(emitted, ["'delta'", "'alpha'", "'charlie'", "'bravo'"]);
}

#[rstest]
#[case::unset(None)]
#[case::empty(Some(""))]
fn missing_output_dir_fails_without_output(mut build: BuildOutput, #[case] value: Option<&str>) {
    build.write_manifest("[]");
    match value {
        Some(value) => build.set_var(OUTPUT_DIR_VAR, value),
        None => build.remove_var(OUTPUT_DIR_VAR),
    }

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert_eq!(outcome.stderr, "$out not set\n");
}

#[rstest]
fn missing_manifest_path_is_reported(mut build: BuildOutput) {
    build.remove_var(MANIFEST_PATH_VAR);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(outcome.stderr, "$pluginsPath not set\n");
}

#[rstest]
fn unreadable_manifest_is_reported(build: BuildOutput) {
    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.starts_with("failed to read plugin manifest"),
        "stderr: {}",
        outcome.stderr
    );
    assert_eq!(outcome.stderr.lines().count(), 1);
}

#[rstest]
fn malformed_manifest_is_reported(build: BuildOutput) {
    build.write_manifest(r#"[{"type":"secret","pname":"#);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.starts_with("failed to parse plugin manifest"),
        "stderr: {}",
        outcome.stderr
    );
}

#[rstest]
fn missing_binary_stops_after_preceding_lines(build: BuildOutput) {
    let first = build.install_binary("first", b"1");
    build.install_binary("third", b"3");
    build.write_manifest(
        r#"[
            {"type":"secret","pname":"first"},
            {"type":"secret","pname":"second","version":"2.0"},
            {"type":"secret","pname":"third"}
        ]"#,
    );

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(
        outcome.stdout,
        format!("'vault' plugin register -sha256={first} -command='first' 'secret' 'first'\n")
    );
    assert!(
        outcome.stderr.contains("second-2.0"),
        "stderr: {}",
        outcome.stderr
    );
    assert_eq!(outcome.stderr.lines().count(), 1);
}

#[rstest]
fn help_is_printed_to_stdout(build: BuildOutput) {
    let outcome = build.run(&["-help"]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("--vault <PATH>"), "stdout: {}", outcome.stdout);
    assert!(outcome.stderr.is_empty());
}

#[rstest]
#[case::single(&["extra"])]
#[case::before_flags(&["extra", "-vault", "/opt/vault/bin/vault"])]
fn trailing_operands_are_ignored(build: BuildOutput, #[case] args: &[&str]) {
    let digest = build.install_binary("foo", b"plain");
    build.write_manifest(r#"[{"type":"auth","pname":"foo"}]"#);

    let outcome = build.run(args);

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        format!("'vault' plugin register -sha256={digest} -command='foo' 'auth' 'foo'\n")
    );
}

#[rstest]
fn mixed_case_manifest_keys_are_recognised(build: BuildOutput) {
    let digest = build.install_binary("foo-1", b"folded");
    build.write_manifest(r#"[{"Type":"secret","PName":"foo","Version":"1"}]"#);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        format!(
            "'vault' plugin register -sha256={digest} -command='foo-1' -version='1' 'secret' 'foo'\n"
        )
    );
}

#[rstest]
fn positional_manifest_entries_are_rejected(build: BuildOutput) {
    build.write_manifest(r#"[["secret","foo","1.0.0"]]"#);

    let outcome = build.run(&[]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.starts_with("failed to parse plugin manifest"),
        "stderr: {}",
        outcome.stderr
    );
}

#[rstest]
fn unknown_flag_is_a_usage_error(build: BuildOutput) {
    let outcome = build.run(&["--frobnicate"]);

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("--frobnicate"), "stderr: {}", outcome.stderr);
}
