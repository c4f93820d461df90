use crate::common::{evm, fixture, word_line, ANSWER, ECHO};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_inline_code_prints_output() {
    evm()
        .args(["run", "--code", ANSWER])
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_execution_error_is_reported_not_fatal() {
    for _ in 0..2 {
        evm()
            .args(["run", "--code", "0x600052"])
            .assert()
            .success()
            .stdout("0x\n error: stack underflow\n");
    }
}

#[test]
fn test_codefile_reads_file() {
    let path = fixture("answer.hex");
    evm()
        .args(["run", "--codefile"])
        .arg(&path)
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_codefile_dash_reads_stdin() {
    evm()
        .args(["run", "--codefile", "-"])
        .write_stdin(format!("0x{}\n", ANSWER))
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_inline_code_wins_over_codefile() {
    evm()
        .args(["run", "--code", "00", "--codefile", "/nonexistent/code.hex"])
        .assert()
        .success()
        .stdout("0x\n");
}

#[test]
fn test_assembly_source_is_compiled() {
    evm()
        .arg("run")
        .arg(fixture("answer.asm"))
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_input_is_passed_as_call_data() {
    evm()
        .args(["run", "--code", ECHO, "--input", "0xdeadbeef"])
        .assert()
        .success()
        .stdout("0xdeadbeef\n");
}

#[test]
fn test_inputfile_overrides_input() {
    evm()
        .args(["run", "--code", ECHO, "--input", "0x01", "--inputfile"])
        .arg(fixture("input.hex"))
        .assert()
        .success()
        .stdout("0xdeadbeef\n");
}

#[test]
fn test_create_returns_deployed_code() {
    evm()
        .args(["run", "--create", "--code", ANSWER])
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_no_code_runs_against_empty_receiver() {
    evm().arg("run").assert().success().stdout("0x\n");
}

#[test]
fn test_genesis_code_and_storage_are_used() {
    evm()
        .args(["run", "--prestate"])
        .arg(fixture("genesis.json"))
        .assert()
        .success()
        .stdout(word_line(6));
}

#[test]
fn test_genesis_alias_and_dump() {
    let output = evm()
        .args(["run", "--dump", "--genesis"])
        .arg(fixture("genesis.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.ends_with(&word_line(6)));
    let dump_text = stdout.trim_end_matches(&word_line(6));
    let dump: serde_json::Value = serde_json::from_str(dump_text).unwrap();

    let receiver = &dump["accounts"]["0x0000000000000000000000007265636569766572"];
    let slot = format!("0x{}", "00".repeat(32));
    assert_eq!(
        receiver["storage"][slot.as_str()],
        format!("0x{}06", "00".repeat(31))
    );
    assert_eq!(
        dump["accounts"]["0x000000000000000000000000000073656e646572"]["balance"],
        "1000000000000000000"
    );
}

#[test]
fn test_receiver_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let genesis = dir.path().join("genesis.json");
    let text = fs::read_to_string(fixture("genesis.json"))
        .unwrap()
        .replace("7265636569766572", "00000000000000aa");
    fs::write(&genesis, text).unwrap();

    evm()
        .env("EVM_RECEIVER", "0xaa")
        .args(["run", "--prestate"])
        .arg(&genesis)
        .assert()
        .success()
        .stdout(word_line(6));
}

#[test]
fn test_value_transfer_needs_funded_sender() {
    evm()
        .args(["run", "--code", "00", "--value", "1"])
        .assert()
        .success()
        .stdout("0x\n error: insufficient balance for transfer\n");

    evm()
        .args(["run", "--code", "00", "--value", "1", "--prestate"])
        .arg(fixture("genesis.json"))
        .assert()
        .success()
        .stdout("0x\n");
}

#[test]
fn test_gas_price_does_not_need_funds() {
    // GASPRICE PUSH1 0 MSTORE PUSH1 0x20 PUSH1 0 RETURN
    evm()
        .args(["run", "--price", "1", "--code", "3a60005260206000f3"])
        .assert()
        .success()
        .stdout(word_line(1));
}

#[test]
fn test_small_gas_limit_runs_code() {
    evm()
        .args(["run", "--gas", "100", "--code", ANSWER])
        .assert()
        .success()
        .stdout(word_line(0x2a));
}

#[test]
fn test_plain_call_leaves_sender_untouched() {
    let output = evm()
        .args(["run", "--dump", "--price", "1", "--code", "00"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let dump: serde_json::Value = serde_json::from_str(stdout.trim_end_matches("0x\n")).unwrap();
    let sender = &dump["accounts"]["0x000000000000000000000000000073656e646572"];
    assert_eq!(sender["nonce"], 0);
    assert_eq!(sender["balance"], "0");
}
