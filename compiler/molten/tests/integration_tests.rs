// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Integration tests for the molten driver CLI.
//!
//! These tests only exercise the front half of the driver (CLI handling,
//! parsing, validation, generation) and therefore run without a C++
//! toolchain; everything past the initial build lives in the end-to-end
//! suite.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_temp_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let filename = format!(
        "molten_test_{}_{}_{}.mlt",
        std::process::id(),
        nanos,
        counter
    );
    std::env::temp_dir().join(filename)
}

/// Run the driver over a program source, returning the captured output.
fn run_molten(code: &str, extra_args: &[&str]) -> Output {
    let temp_file = unique_temp_path();
    std::fs::write(&temp_file, code).expect("write program file");

    let output = Command::new(env!("CARGO_BIN_EXE_molten"))
        .arg(&temp_file)
        .args(extra_args)
        .output()
        .expect("failed to execute molten");

    let _ = std::fs::remove_file(&temp_file);
    output
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn integration_field_declaration_is_fatal() {
    let output = run_molten(
        r#"
class P extends HotReloadProgram {
    counter: number = 0;
    main(): number { return 0; }
}
"#,
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("field declarations are not supported"),
        "stderr should name the construct: {stderr}"
    );
}

#[test]
fn integration_parse_error_is_fatal() {
    let output = run_molten(
        r#"
class P extends HotReloadProgram {
    main() { return 0; }
}
"#,
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr_of(&output).is_empty());
}

#[test]
fn integration_unknown_annotation_is_fatal() {
    let output = run_molten(
        r#"
class P extends HotReloadProgram {
    @inline
    f(a: number): number { return a; }
    main(): number { return 0; }
}
"#,
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("unsupported annotation @inline"));
}

#[test]
fn integration_missing_file_is_fatal() {
    let output = Command::new(env!("CARGO_BIN_EXE_molten"))
        .arg("/nonexistent/molten/program.mlt")
        .output()
        .expect("failed to execute molten");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("failed to read"));
}

#[test]
fn integration_browser_backend_is_unavailable() {
    let output = run_molten(
        r#"
class P extends HotReloadProgram {
    main(): number { return 0; }
}
"#,
        &["--backend", "browser"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("browser backend"));
}

#[test]
fn integration_show_generated_prints_main_unit() {
    // Generation happens (and prints) before the toolchain runs, so this
    // holds with or without a compiler installed.
    let output = run_molten(
        r#"
class P extends HotReloadProgram {
    @hotreload
    shift(a: number): number { return a + 0; }
    main(): number { return self.shift(1); }
}
"#,
        &["--show-generated"],
    );

    let stderr = stderr_of(&output);
    assert!(stderr.contains("int main() {"), "missing main: {stderr}");
    assert!(
        stderr.contains("HotReload<int(int)> shift("),
        "missing cell wiring: {stderr}"
    );
    assert!(
        stderr.contains("return shift.get()(1);"),
        "missing call rewrite: {stderr}"
    );
}

#[test]
fn integration_help_names_the_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_molten"))
        .arg("--help")
        .output()
        .expect("failed to execute molten");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(stdout.contains("--backend"));
    assert!(stdout.contains("--show-generated"));
}
