//! End-to-end CLI tests: invoke the compiled binary and inspect its
//! stdout/stderr/exit-code contract directly.

use assert_cmd::Command;
use predicates::prelude::*;

fn cminic() -> Command {
    Command::cargo_bin("cminic").unwrap()
}

#[test]
fn wrong_argument_count_fails() {
    cminic()
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument count"));
}

#[test]
fn too_many_arguments_fails() {
    cminic()
        .arg("main(){ return 0; }")
        .arg("extra")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument count"));
}

#[test]
fn successful_compile_emits_intel_syntax_preamble() {
    cminic()
        .arg("main(){ return 0; }")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(".intel_syntax noprefix"))
        .stdout(predicate::str::contains(".global main"));
}

#[test]
fn double_plus_is_a_parse_error() {
    // "1++;" parses the second `+` as a unary prefix, then fails to find
    // a primary expression at the `;` that follows it.
    let src = "main(){ 1++; }";
    let caret_offset = src.find("; }").unwrap();
    let expected_caret = format!("{}^ ", " ".repeat(caret_offset));

    cminic()
        .arg(src)
        .assert()
        .failure()
        .stderr(predicate::function(move |out: &str| out.contains(&expected_caret)));
}

#[test]
fn parse_error_reports_offset_and_fails() {
    let src = "main(){ return 1 }";
    let caret_offset = src.len() - 1;
    let expected_caret = format!("{}^ ", " ".repeat(caret_offset));

    cminic()
        .arg(src)
        .assert()
        .failure()
        .stderr(predicate::str::contains(src))
        .stderr(predicate::function(move |out: &str| out.contains(&expected_caret)));
}

#[test]
fn fibonacci_program_compiles() {
    let src = "fib(n){ if(n<2) return n; return fib(n-1)+fib(n-2); } main(){ return fib(9); }";
    cminic()
        .arg(src)
        .assert()
        .success()
        .stdout(predicate::str::contains(".global fib"))
        .stdout(predicate::str::contains(".global main"));
}
