use super::{capture_step, complete_step, LogConfig};
use crate::runtime::ExecOutput;
use alloy_primitives::{Address, Bytes, B256, U256};
use revm::interpreter::{opcode, Interpreter};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One executed opcode as seen by the tracers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLog {
    pub pc: u64,
    pub op: u8,
    pub op_name: &'static str,
    /// Gas available before the opcode ran.
    pub gas: u64,
    pub gas_cost: u64,
    pub memory: Option<Bytes>,
    pub mem_size: usize,
    pub stack: Option<Vec<U256>>,
    pub return_data: Option<Bytes>,
    /// Storage of the executing contract as observed so far, captured on
    /// `SLOAD` and `SSTORE` only.
    pub storage: Option<BTreeMap<B256, B256>>,
    pub depth: u64,
    pub refund: u64,
    pub error: Option<String>,
}

/// Records every step in memory for the `--debug` trace dump.
pub struct StructLogger {
    config: LogConfig,
    logs: Vec<StructLog>,
    storage: HashMap<Address, BTreeMap<B256, B256>>,
    pending: Option<PendingStep>,
}

struct PendingStep {
    log: StructLog,
    /// Set for `SLOAD`: the value is read off the stack once the load ran.
    sload: Option<(Address, B256)>,
}

impl StructLogger {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            logs: Vec::new(),
            storage: HashMap::new(),
            pending: None,
        }
    }

    pub fn logs(&self) -> &[StructLog] {
        &self.logs
    }

    fn at_limit(&self) -> bool {
        self.config.limit != 0 && self.logs.len() >= self.config.limit
    }

    pub(crate) fn on_step(&mut self, interp: &Interpreter, depth: u64) {
        if self.at_limit() {
            return;
        }
        let mut log = capture_step(interp, depth, &self.config);
        let mut sload = None;

        if !self.config.disable_storage {
            let stack = interp.stack.data();
            let address = interp.contract.target_address;
            match (log.op, stack.as_slice()) {
                (opcode::SSTORE, [.., value, key]) => {
                    let contract = self.storage.entry(address).or_default();
                    contract.insert(word(key), word(value));
                    log.storage = Some(contract.clone());
                }
                (opcode::SLOAD, [.., key]) => sload = Some((address, word(key))),
                _ => {}
            }
        }

        self.pending = Some(PendingStep { log, sload });
    }

    pub(crate) fn on_step_end(&mut self, interp: &Interpreter) {
        let Some(PendingStep { mut log, sload }) = self.pending.take() else {
            return;
        };
        complete_step(&mut log, interp);

        if let (Some((address, key)), Some(value)) = (sload, interp.stack.data().last()) {
            let contract = self.storage.entry(address).or_default();
            contract.insert(key, word(value));
            log.storage = Some(contract.clone());
        }
        self.logs.push(log);
    }

    pub(crate) fn capture_end(&mut self, output: &ExecOutput) {
        debug!(
            steps = self.logs.len(),
            output_len = output.output.len(),
            failed = output.error.is_some(),
            "struct logger finished"
        );
    }
}

fn word(value: &U256) -> B256 {
    B256::new(value.to_be_bytes())
}
