use super::{capture_step, complete_step, word_hex, LogConfig, StructLog};
use crate::runtime::ExecOutput;
use revm::interpreter::Interpreter;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

/// Streams one JSON object per step, then a summary object per execution.
pub struct JsonLogger {
    config: LogConfig,
    out: Box<dyn Write>,
    pending: Option<StructLog>,
    steps: usize,
    failed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonStep<'a> {
    pc: u64,
    op: u8,
    gas: String,
    gas_cost: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
    mem_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_data: Option<String>,
    depth: u64,
    refund: u64,
    op_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a StructLog> for JsonStep<'a> {
    fn from(log: &'a StructLog) -> Self {
        Self {
            pc: log.pc,
            op: log.op,
            gas: format!("{:#x}", log.gas),
            gas_cost: format!("{:#x}", log.gas_cost),
            memory: log.memory.as_ref().map(|m| format!("0x{}", hex::encode(m))),
            mem_size: log.mem_size,
            stack: log
                .stack
                .as_ref()
                .map(|stack| stack.iter().map(word_hex).collect()),
            return_data: log
                .return_data
                .as_ref()
                .map(|r| format!("0x{}", hex::encode(r))),
            depth: log.depth,
            refund: log.refund,
            op_name: log.op_name,
            error: log.error.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    output: String,
    gas_used: String,
    /// Nanoseconds.
    time: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl JsonLogger {
    pub fn new(config: LogConfig, out: Box<dyn Write>) -> Self {
        Self {
            config,
            out,
            pending: None,
            steps: 0,
            failed: false,
        }
    }

    pub(crate) fn on_step(&mut self, interp: &Interpreter, depth: u64) {
        if self.config.limit != 0 && self.steps >= self.config.limit {
            return;
        }
        self.pending = Some(capture_step(interp, depth, &self.config));
    }

    pub(crate) fn on_step_end(&mut self, interp: &Interpreter) {
        let Some(mut log) = self.pending.take() else {
            return;
        };
        complete_step(&mut log, interp);
        self.steps += 1;
        self.emit(&JsonStep::from(&log));
    }

    pub(crate) fn capture_end(&mut self, output: &ExecOutput, gas_used: u64, elapsed: Duration) {
        let error = output.error.as_ref().map(ToString::to_string);
        let summary = JsonSummary {
            output: hex::encode(&output.output),
            gas_used: format!("{:#x}", gas_used),
            time: elapsed.as_nanos(),
            error: error.as_deref(),
        };
        self.emit(&summary);
        if let Err(e) = self.out.flush() {
            self.report(e);
        }
    }

    fn emit<T: Serialize>(&mut self, record: &T) {
        let result = serde_json::to_writer(&mut self.out, record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        if let Err(e) = result {
            self.report(e);
        }
    }

    // Only the first write failure is logged; a closed stdout would otherwise
    // produce one warning per opcode.
    fn report(&mut self, e: std::io::Error) {
        if !self.failed {
            warn!("Failed to write JSON trace: {}", e);
            self.failed = true;
        }
    }
}
