use crate::common::{evm, fixture};
use predicates::prelude::*;

#[test]
fn test_odd_length_code_is_fatal() {
    evm()
        .args(["run", "--code", "600"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Invalid input length for hex data (3)"));
}

#[test]
fn test_odd_length_input_is_fatal() {
    evm()
        .args(["run", "--code", "00", "--input", "0x123"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Invalid input length for hex data (5)"));
}

#[test]
fn test_invalid_hex_is_fatal() {
    evm()
        .args(["run", "--code", "0xzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid hex data"));
}

#[test]
fn test_missing_codefile() {
    evm()
        .args(["run", "--codefile", "/nonexistent/code.hex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load code"));
}

#[test]
fn test_missing_genesis() {
    evm()
        .args(["run", "--code", "00", "--prestate", "/nonexistent/genesis.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read genesis file"));
}

#[test]
fn test_malformed_genesis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genesis.json");
    std::fs::write(&path, "{ not json").unwrap();

    evm()
        .args(["run", "--code", "00", "--prestate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid genesis file"));
}

#[test]
fn test_assembler_error_names_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.asm");
    std::fs::write(&path, "PUSH1 0x01\nNOTANOPCODE\n").unwrap();

    evm()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_bad_sender_is_rejected_by_parser() {
    evm()
        .args(["run", "--code", "00", "--sender", "0xnothex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid address"));
}

#[test]
fn test_unwritable_memprofile() {
    evm()
        .args(["run", "--code", "00", "--memprofile", "/nonexistent/dir/mem.json"])
        .arg("--genesis")
        .arg(fixture("genesis.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("memory profile"));
}

#[test]
fn test_cpuprofile_is_stopped_when_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cpu.svg");
    evm()
        .args(["run", "--code", "00", "--input", "abc", "--cpuprofile"])
        .arg(&path)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Invalid input length for hex data (3)"))
        .stderr(predicate::str::contains("panicked").not());
    assert!(path.exists());
}
