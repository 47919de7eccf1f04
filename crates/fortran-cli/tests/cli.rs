// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runs the `fortran` binary against fixture files.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn fortran(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fortran"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("FORCE_COLOR")
        .env_remove("FORTRAN_LOG")
        .output()
        .expect("failed to run the fortran binary")
}

fn run_on(command: &str, file: &str, extra: &[&str]) -> Output {
    let path = fixture(file);
    let mut args = vec![command, path.to_str().unwrap()];
    args.extend_from_slice(extra);
    fortran(&args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn clean_file_checks_ok() {
    let output = run_on("check", "ok.f90", &[]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("=== Check OK ==="));
}

#[test]
fn errors_exit_with_one() {
    let output = run_on("check", "broken.f90", &[]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("undefined name: `totl`"), "{}", out);
    assert!(out.contains("did you mean `total`?"), "{}", out);
    assert!(stderr(&output).contains("Check FAILED: 1 error"));
}

#[test]
fn json_report() {
    let output = run_on("check", "broken.f90", &["--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["phase"], "Check");
    assert_eq!(report["error_count"], 1);
    let diagnostic = &report["diagnostics"][0];
    assert_eq!(diagnostic["severity"], "error");
    assert_eq!(diagnostic["code"], "E0200");
    assert_eq!(diagnostic["location"]["line"], 5);
}

#[test]
fn fixed_form_from_extension() {
    let output = run_on("check", "legacy.f", &[]);
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));

    let lexed = run_on("lex", "legacy.f", &[]);
    assert_eq!(lexed.status.code(), Some(0));
    assert!(stdout(&lexed).lines().next().unwrap().starts_with("1:7 "));
    assert!(stdout(&lexed).contains("\"LEGACY\""));
}

#[test]
fn parse_prints_the_tree() {
    let output = run_on("parse", "ok.f90", &[]);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.starts_with("(Root"), "{}", out);
    assert!(out.contains("DoConstruct"));
    assert!(stderr(&output).contains("=== Parse OK ==="));
}

#[test]
fn resolve_lists_symbols() {
    let output = run_on("resolve", "ok.f90", &[]);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("program counter"), "{}", out);
    assert!(out.contains("variable n: integer"), "{}", out);
    assert!(out.contains("variable total: real"), "{}", out);
}

#[test]
fn warnings_do_not_fail() {
    let mut file = tempfile::Builder::new().suffix(".f90").tempfile().unwrap();
    writeln!(file, "program p\n  integer :: a = 'a'\nend program p").unwrap();
    let output = fortran(&["check", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("warning"));
    assert!(stderr(&output).contains("Check OK with 1 warning"));
}

#[test]
fn missing_file_is_a_tool_error() {
    let output = fortran(&["check", "does/not/exist.f90"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("reading does/not/exist.f90"));
}
