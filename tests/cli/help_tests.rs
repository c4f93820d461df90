use crate::common::evm;
use predicates::prelude::*;

#[test]
fn test_top_level_help_lists_run() {
    evm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("--verbosity"));
}

#[test]
fn test_run_help_lists_flags() {
    let assert = evm().args(["run", "--help"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for flag in [
        "--code",
        "--codefile",
        "--input",
        "--inputfile",
        "--prestate",
        "--create",
        "--bench",
        "--dump",
        "--statdump",
        "--json",
        "--debug",
        "--nomemory",
        "--limit",
        "--cpuprofile",
        "--memprofile",
    ] {
        assert!(stdout.contains(flag), "missing {} in help:\n{}", flag, stdout);
    }
}
