/// End-to-end tests: run the `famms` binary and check what it prints.
///
/// Each run gets a scratch directory as working directory, `HOME` and
/// `XDG_CONFIG_HOME`, so a developer's own `~/.fammsrc` never leaks in.
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn famms(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_famms"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("FAMMS_LOG")
        .output()
        .expect("failed to run famms")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Functor smoke test ────────────────────────────────────────────────────────

#[test]
fn default_run_prints_base_functor() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &[]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "5.000000 \n1.000000 4.000000 \n");
}

#[test]
fn coordinates_on_the_command_line() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["3", "-4"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "25.000000 \n9.000000 16.000000 \n");
}

#[test]
fn vector_expression() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["-e", "x_0 * t", "-e", "x_1^2", "-t", "0.5"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let lines: Vec<String> = stdout(&out).lines().map(str::to_owned).collect();
    assert_eq!(lines, ["0.000000 ", "0.500000 4.000000 "]);
}

#[test]
fn failing_callback_warns_on_stderr() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["-e", "x_5"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("0.000000 \n"));
    assert!(stderr(&out).contains("scalar callback failed"), "{}", stderr(&out));
}

#[test]
fn quiet_suppresses_warnings() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["-q", "-e", "x_5"]);
    assert!(out.status.success());
    assert!(!stderr(&out).contains("scalar callback failed"));
}

// ── Problem files ─────────────────────────────────────────────────────────────

const POISSON: &str = "\
; manufactured Poisson problem
/solution x_0^2 + x_1^2
/equation poisson
";

#[test]
fn explicit_problem_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("poisson.famms"), POISSON).unwrap();
    let out = famms(dir.path(), &["-f", "poisson.famms"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "set_v_func: 5.000000 \nset_b_func: -4.000000 \nset_v_func grad: 2.000000 4.000000 \n"
    );
}

#[test]
fn problem_file_found_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".fammsrc"), POISSON).unwrap();
    let out = famms(dir.path(), &["0", "1"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).starts_with("set_v_func: 1.000000 \n"));
}

#[test]
fn skip_flag_ignores_problem_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".fammsrc"), POISSON).unwrap();
    let out = famms(dir.path(), &["-f"]);
    assert_eq!(stdout(&out), "5.000000 \n1.000000 4.000000 \n");
}

#[test]
fn incomplete_problem_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("p.famms"), "/solution x_0\n").unwrap();
    let out = famms(dir.path(), &["-fp.famms"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("famms: the problem must at least specify the equation"));
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn unknown_option_prints_usage() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["-z"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("famms: unknown option: -z"), "{err}");
    assert!(err.contains("Usage:"), "{err}");
}

#[test]
fn bad_expression_is_an_error() {
    let dir = TempDir::new().unwrap();
    let out = famms(dir.path(), &["-e", "sin("]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("famms: parse error"), "{}", stderr(&out));
}
