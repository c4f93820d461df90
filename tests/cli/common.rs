use assert_cmd::Command;
use std::path::PathBuf;

/// Returns-42 program: PUSH1 0x2a PUSH1 0 MSTORE PUSH1 0x20 PUSH1 0 RETURN
pub const ANSWER: &str = "602a60005260206000f3";

/// Echoes its call data back.
pub const ECHO: &str = "366000600037366000f3";

/// `evm` with logging silenced and the address env fallbacks cleared.
pub fn evm() -> Command {
    let mut cmd = Command::cargo_bin("evm").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("EVM_SENDER")
        .env_remove("EVM_RECEIVER")
        .env_remove("EVM_GAS")
        .env("EVM_VERBOSITY", "1");
    cmd
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The 32-byte word holding `value`, as printed on stdout.
pub fn word_line(value: u8) -> String {
    format!("0x{}{:02x}\n", "00".repeat(31), value)
}
