//! CLI interface tests using `assert_cmd` to drive the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sweepvm_cmd() -> Command {
    Command::cargo_bin("sweepvm").unwrap()
}

fn write_program(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn help_output_lists_subcommands() {
    sweepvm_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("tokens"))
        .stdout(predicate::str::contains("trace"));
}

#[test]
fn run_prints_the_program_output() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "hello.tok", "print str 216");

    sweepvm_cmd()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("216"));
}

#[test]
fn tokens_prints_the_compiled_stream_without_running_it() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "add.tok", "add 2 3");

    sweepvm_cmd()
        .arg("tokens")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("2"))
        .stdout(predicate::str::contains("3"));
}

#[test]
fn run_reports_a_parse_error_for_an_unbalanced_container() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "bad.tok", "list 1 2 3");

    sweepvm_cmd().arg("run").arg(&path).assert().failure();
}

#[test]
fn trace_succeeds_on_a_program_that_takes_several_sweeps() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "cond.tok", "if 1 q 42 q 99");

    sweepvm_cmd()
        .arg("trace")
        .arg(&path)
        .arg("--max-iterations")
        .arg("10")
        .assert()
        .success();
}

#[test]
fn run_honors_the_max_iterations_override() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "loop.tok", "move 0 0");

    sweepvm_cmd()
        .arg("run")
        .arg(&path)
        .arg("--max-iterations")
        .arg("2")
        .assert()
        .success();
}
