//! Execution tracers.
//!
//! Exactly one [`Tracer`] variant is selected per run:
//!
//! - [`Tracer::Json`] streams one JSON object per executed opcode to stdout.
//! - [`Tracer::Struct`] records every step in memory for the `--debug` dump.
//! - [`Tracer::None`] still owns a [`StructLogger`], but it is never
//!   registered with the VM, so nothing is recorded.

pub mod format;
pub mod json_logger;
pub mod struct_logger;

pub use format::{hex_dump, write_logs, write_trace};
pub use json_logger::JsonLogger;
pub use struct_logger::{StructLog, StructLogger};

use crate::runtime::ExecOutput;
use alloy_primitives::{Bytes, U256};
use revm::interpreter::{opcode::OpCode, Interpreter};
use revm::{Database, EvmContext, Inspector};
use std::io::Write;
use std::time::Duration;

/// What the tracers capture at each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub enable_memory: bool,
    pub disable_stack: bool,
    pub disable_storage: bool,
    pub enable_return_data: bool,
    pub debug: bool,
    /// Maximum number of recorded steps, 0 for no limit.
    pub limit: usize,
}

/// The run's tracer, chosen once before execution.
pub enum Tracer {
    /// Inactive: the logger is kept but not wired into the VM.
    None(StructLogger),
    Struct(StructLogger),
    Json(JsonLogger),
}

impl Tracer {
    /// `machine` (JSON) takes precedence over `debug`.
    pub fn select(machine: bool, debug: bool, config: LogConfig, out: Box<dyn Write>) -> Self {
        if machine {
            Tracer::Json(JsonLogger::new(config, out))
        } else if debug {
            Tracer::Struct(StructLogger::new(config))
        } else {
            Tracer::None(StructLogger::new(config))
        }
    }

    /// Whether the VM should call into this tracer while executing.
    pub fn is_active(&self) -> bool {
        !matches!(self, Tracer::None(_))
    }

    /// Steps recorded by the active structured logger.
    pub fn struct_logs(&self) -> Option<&[StructLog]> {
        match self {
            Tracer::Struct(logger) => Some(logger.logs()),
            _ => None,
        }
    }

    /// Called once after each top-level execution finishes.
    pub fn capture_end(&mut self, output: &ExecOutput, gas_used: u64, elapsed: Duration) {
        match self {
            Tracer::Json(logger) => logger.capture_end(output, gas_used, elapsed),
            Tracer::Struct(logger) => logger.capture_end(output),
            Tracer::None(_) => {}
        }
    }
}

impl<DB: Database> Inspector<DB> for Tracer {
    fn step(&mut self, interp: &mut Interpreter, context: &mut EvmContext<DB>) {
        let depth = context.journaled_state.depth();
        match self {
            Tracer::Struct(logger) => logger.on_step(interp, depth),
            Tracer::Json(logger) => logger.on_step(interp, depth),
            Tracer::None(_) => {}
        }
    }

    fn step_end(&mut self, interp: &mut Interpreter, _context: &mut EvmContext<DB>) {
        match self {
            Tracer::Struct(logger) => logger.on_step_end(interp),
            Tracer::Json(logger) => logger.on_step_end(interp),
            Tracer::None(_) => {}
        }
    }
}

/// Interpreter state captured before an opcode runs. Completed with the gas
/// cost and error once the opcode has executed.
pub(crate) fn capture_step(interp: &Interpreter, depth: u64, config: &LogConfig) -> StructLog {
    let op = interp.current_opcode();
    let memory = interp.shared_memory.context_memory();
    StructLog {
        pc: interp.program_counter() as u64,
        op,
        op_name: OpCode::new(op).map(|code| code.as_str()).unwrap_or("opcode"),
        gas: interp.gas.remaining(),
        gas_cost: 0,
        memory: config
            .enable_memory
            .then(|| Bytes::copy_from_slice(memory)),
        mem_size: memory.len(),
        stack: (!config.disable_stack).then(|| interp.stack.data().to_vec()),
        return_data: config
            .enable_return_data
            .then(|| interp.return_data_buffer.clone()),
        storage: None,
        depth,
        refund: interp.gas.refunded().max(0) as u64,
        error: None,
    }
}

/// Fill in what is only known after the opcode ran.
pub(crate) fn complete_step(log: &mut StructLog, interp: &Interpreter) {
    log.gas_cost = log.gas.saturating_sub(interp.gas.remaining());
    if interp.instruction_result.is_error() {
        log.error = Some(format!("{:?}", interp.instruction_result));
    }
}

/// `0x`-prefixed minimal hex, as used for stack words.
pub(crate) fn word_hex(word: &U256) -> String {
    format!("{:#x}", word)
}
