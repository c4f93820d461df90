use crate::common::{evm, fixture, ANSWER};
use predicates::prelude::*;
use serde_json::Value;

/// PUSH1 0x07 PUSH1 0 PUSH1 0 LOG1 STOP
const LOGGER: &str = "600760006000a100";

#[test]
fn test_debug_prints_trace_and_logs_to_stderr() {
    evm()
        .args(["run", "--debug", "--code", LOGGER])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("#### TRACE ####"))
        .stderr(predicate::str::contains("PUSH1           pc=00000000"))
        .stderr(predicate::str::contains("LOG1            pc=00000006"))
        .stderr(predicate::str::contains("#### LOGS ####"))
        .stderr(predicate::str::contains(
            "LOG1: 0000000000000000000000007265636569766572 bn=0 txi=0",
        ));
}

#[test]
fn test_debug_limit_caps_recorded_steps() {
    let output = evm()
        .args(["run", "--debug", "--limit", "2", "--code", LOGGER])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.matches("pc=").count(), 2);
}

#[test]
fn test_debug_reports_step_error() {
    evm()
        .args(["run", "--debug", "--code", "600052"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("MSTORE"))
        .stderr(predicate::str::contains("ERROR: StackUnderflow"));
}

#[test]
fn test_statdump_prints_stats_block() {
    evm()
        .args(["run", "--statdump", "--code", ANSWER])
        .assert()
        .success()
        .stdout(format!("0x{}2a\n", "00".repeat(31)))
        .stderr(predicate::str::contains("EVM gas used:    "))
        .stderr(predicate::str::contains("execution time:  "))
        .stderr(predicate::str::contains("allocations:     "))
        .stderr(predicate::str::contains("allocated bytes: "));
}

#[test]
fn test_statdump_gas_uses_genesis_limit() {
    let output = evm()
        .args(["run", "--statdump", "--gas", "1", "--prestate"])
        .arg(fixture("genesis.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let used: u64 = stderr
        .lines()
        .find_map(|l| l.strip_prefix("EVM gas used:"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    // cold SLOAD plus SSTORE; --gas 1 alone could not pay for it
    assert!((2_100..21_000).contains(&used), "gas used {}", used);
}

#[test]
fn test_bench_prints_stats_and_result() {
    evm()
        .args(["run", "--bench", "--code", "00"])
        .assert()
        .success()
        .stdout("0x\n")
        .stderr(predicate::str::contains("EVM gas used:    0\n"));
}

#[test]
fn test_statdump_counts_only_executed_code() {
    // PUSH1 0x2a PUSH1 0 MSTORE PUSH1 0x20 PUSH1 0 RETURN: 4 pushes, MSTORE with one word of memory
    evm()
        .args(["run", "--statdump", "--gas", "100", "--code", ANSWER])
        .assert()
        .success()
        .stderr(predicate::str::contains("EVM gas used:    18\n"));
}

#[test]
fn test_json_streams_steps_and_summary() {
    let output = evm()
        .args(["run", "--json", "--code", ANSWER])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0]["opName"], "PUSH1");
    assert_eq!(lines[0]["pc"], 0);
    assert_eq!(lines[0]["depth"], 1);
    assert_eq!(lines[5]["opName"], "RETURN");

    let summary = &lines[6];
    assert_eq!(summary["output"], format!("{}2a", "00".repeat(31)));
    assert!(summary["gasUsed"].as_str().unwrap().starts_with("0x"));
    assert!(summary.get("error").is_none());
}

#[test]
fn test_json_wins_over_debug() {
    evm()
        .args(["run", "--json", "--debug", "--code", "00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"opName\":\"STOP\""))
        .stderr(predicate::str::contains("#### TRACE ####").not())
        .stderr(predicate::str::contains("#### LOGS ####"));
}

#[test]
fn test_memprofile_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mem.json");
    evm()
        .args(["run", "--code", ANSWER, "--memprofile"])
        .arg(&path)
        .assert()
        .success();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(json["allocations"].as_u64().unwrap() > 0);
    assert!(json["live_bytes"].is_u64());
}

#[test]
fn test_cpuprofile_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cpu.svg");
    evm()
        .args(["run", "--code", ANSWER, "--cpuprofile"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());
}
