use std::path::PathBuf;
use thiserror::Error;

/// Configuration failures that abort a run before (or instead of) execution.
///
/// Execution-time failures reported by the VM are *not* represented here; see
/// [`crate::runtime::VmError`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to read genesis file {path}: {source}")]
    GenesisRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid genesis file: {0}")]
    GenesisParse(#[from] serde_json::Error),

    #[error("Could not load {what} from {origin}: {source}")]
    Load {
        what: &'static str,
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input length for hex data ({0})")]
    OddHexLength(usize),

    #[error("Invalid hex data: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Compilation failed at line {line}: {message}")]
    Assembler { line: usize, message: String },

    #[error("Profiling error: {0}")]
    Profile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunError>;
