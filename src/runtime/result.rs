//! Result types for a single dispatched execution.
//!
//! Execution-time failures never abort the harness: they travel inside
//! [`ExecOutput`] next to whatever output and remaining gas exist, and are
//! printed with the result.

use alloy_primitives::Bytes;
use revm::primitives::{ExecutionResult, HaltReason, Output, OutOfGasError};
use std::fmt;
use thiserror::Error;

/// What the unit of work hands back: output bytes, gas left and an optional
/// execution error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub output: Bytes,
    pub gas_left: u64,
    pub error: Option<VmError>,
}

/// An error raised by the VM while executing. Non-fatal to the harness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("execution reverted")]
    Reverted,
    #[error("{0}")]
    Halted(HaltMessage),
    /// The VM refused the transaction before running any code.
    #[error("{0}")]
    Rejected(String),
}

/// Human-readable rendering of a [`HaltReason`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltMessage(pub HaltReason);

impl fmt::Display for HaltMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            HaltReason::OutOfGas(OutOfGasError::Memory | OutOfGasError::MemoryLimit) => {
                write!(f, "out of gas: memory")
            }
            HaltReason::OutOfGas(_) => write!(f, "out of gas"),
            HaltReason::OpcodeNotFound | HaltReason::InvalidFEOpcode => {
                write!(f, "invalid opcode")
            }
            HaltReason::InvalidJump => write!(f, "invalid jump destination"),
            HaltReason::StackUnderflow => write!(f, "stack underflow"),
            HaltReason::StackOverflow => write!(f, "stack limit reached"),
            HaltReason::OutOfOffset => write!(f, "return data out of bounds"),
            HaltReason::CreateCollision => write!(f, "contract address collision"),
            HaltReason::CallTooDeep => write!(f, "max call depth exceeded"),
            HaltReason::OutOfFunds => write!(f, "insufficient balance for transfer"),
            HaltReason::CreateContractSizeLimit => write!(f, "max code size exceeded"),
            HaltReason::CreateContractStartingWithEF => {
                write!(f, "invalid code: must not begin with 0xef")
            }
            HaltReason::StateChangeDuringStaticCall | HaltReason::CallNotAllowedInsideStatic => {
                write!(f, "write protection")
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// Convert a finished revm execution into the harness's shape.
///
/// `gas_limit` is the gas the execution started with; gas left is derived
/// from it because revm only reports gas used.
pub(crate) fn to_exec_output(result: &ExecutionResult, gas_limit: u64) -> ExecOutput {
    let gas_left = gas_limit.saturating_sub(result.gas_used());
    match result {
        ExecutionResult::Success { output, .. } => {
            let output = match output {
                Output::Call(bytes) => bytes.clone(),
                Output::Create(bytes, _) => bytes.clone(),
            };
            ExecOutput {
                output,
                gas_left,
                error: None,
            }
        }
        ExecutionResult::Revert { output, .. } => ExecOutput {
            output: output.clone(),
            gas_left,
            error: Some(VmError::Reverted),
        },
        ExecutionResult::Halt { reason, .. } => ExecOutput {
            output: Bytes::new(),
            gas_left,
            error: Some(VmError::Halted(HaltMessage(reason.clone()))),
        },
    }
}
