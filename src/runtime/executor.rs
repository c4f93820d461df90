//! Execution configuration and the VM seam.
//!
//! The harness only talks to the VM through [`Vm`]'s two entry points.
//! [`RevmVm`] is the production implementation; it builds a fresh revm
//! instance over the shared [`StateStore`] for every invocation and commits
//! the resulting state diff back into it.
//!
//! Invocations run as bare message calls rather than transactions: no
//! intrinsic gas, no gas bought from or refunded to the sender, no fee paid
//! to the coinbase and no sender balance or nonce checks. The gas price is
//! only observable through `GASPRICE`, and the gas limit is the gas the code
//! itself starts with.

use crate::runtime::genesis::{ChainConfig, Genesis};
use crate::runtime::result::{to_exec_output, ExecOutput, VmError};
use crate::runtime::state::StateStore;
use crate::tracer::Tracer;
use alloy_primitives::{Address, Bytes, B256, U256};
use revm::handler::register::EvmHandler;
use revm::interpreter::Gas;
use revm::primitives::{EVMError, Env, ResultAndState, TxKind};
use revm::{inspector_handle_register, Context, Database, Evm};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Everything the VM needs besides the state and the tracer. Built once per
/// run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub origin: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub value: U256,
    pub difficulty: U256,
    pub timestamp: u64,
    pub coinbase: Address,
    pub block_number: u64,
    pub chain_config: ChainConfig,
    /// `--debug`: dump the captured trace and logs after execution.
    pub debug: bool,
}

impl ExecutionConfig {
    /// Combine the genesis block parameters with the command-line execution
    /// parameters.
    pub fn new(
        genesis: &Genesis,
        origin: Address,
        gas_flag: u64,
        gas_price: U256,
        value: U256,
        debug: bool,
    ) -> Self {
        Self {
            origin,
            gas_limit: initial_gas(genesis.gas_limit, gas_flag),
            gas_price,
            value,
            difficulty: genesis.difficulty,
            timestamp: genesis.timestamp,
            coinbase: genesis.coinbase,
            block_number: genesis.number,
            chain_config: genesis
                .config
                .clone()
                .unwrap_or_else(ChainConfig::all_protocol_changes),
            debug,
        }
    }
}

/// A nonzero genesis gas limit overrides the `--gas` flag.
pub fn initial_gas(genesis_gas_limit: u64, gas_flag: u64) -> u64 {
    if genesis_gas_limit != 0 {
        genesis_gas_limit
    } else {
        gas_flag
    }
}

/// What one invocation borrows: the run's configuration, the shared state and
/// the tracer.
pub struct ExecContext<'a> {
    pub config: &'a ExecutionConfig,
    pub state: &'a mut StateStore,
    pub tracer: &'a mut Tracer,
}

/// The two entry points the harness needs from a VM.
pub trait Vm {
    /// Deploy `input` as init code (constructor arguments already appended).
    fn create(&mut self, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput;

    /// Call `receiver` with `input` as call data.
    fn call(&mut self, receiver: Address, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput;
}

/// [`Vm`] backed by revm.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevmVm;

impl RevmVm {
    fn transact(&mut self, kind: TxKind, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput {
        let config = ctx.config;
        let spec_id = config
            .chain_config
            .spec_id(config.block_number, config.timestamp);
        debug!(?spec_id, ?kind, input_len = input.len(), "transacting");

        let traced = ctx.tracer.is_active();
        let start = Instant::now();
        let outcome = {
            let builder = Evm::builder()
                .with_db(ctx.state.db_mut())
                .with_external_context(&mut *ctx.tracer)
                .with_spec_id(spec_id)
                .modify_cfg_env(|cfg| {
                    cfg.chain_id = config.chain_config.chain_id;
                    cfg.disable_gas_refund = true;
                })
                .modify_block_env(|block| {
                    block.number = U256::from(config.block_number);
                    block.coinbase = config.coinbase;
                    block.timestamp = U256::from(config.timestamp);
                    block.difficulty = config.difficulty;
                    block.prevrandao = Some(B256::new(config.difficulty.to_be_bytes()));
                    block.gas_limit = U256::from(config.gas_limit);
                    block.basefee = U256::ZERO;
                })
                .modify_tx_env(|tx| {
                    tx.caller = config.origin;
                    tx.gas_limit = config.gas_limit;
                    tx.gas_price = config.gas_price;
                    tx.value = config.value;
                    tx.transact_to = kind;
                    tx.data = input;
                    tx.nonce = None;
                    tx.chain_id = None;
                })
                .append_handler_register(message_call_handle_register);

            if traced {
                builder
                    .append_handler_register(inspector_handle_register)
                    .build()
                    .transact()
            } else {
                builder.build().transact()
            }
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(ResultAndState { result, state }) => {
                ctx.state.commit(state);
                ctx.state.add_logs(result.logs().iter().cloned());
                let output = to_exec_output(&result, config.gas_limit);
                ctx.tracer
                    .capture_end(&output, result.gas_used(), elapsed);
                output
            }
            Err(e) => {
                warn!("Transaction rejected: {}", e);
                let output = ExecOutput {
                    output: Bytes::new(),
                    gas_left: config.gas_limit,
                    error: Some(VmError::Rejected(e.to_string())),
                };
                ctx.tracer.capture_end(&output, 0, elapsed);
                output
            }
        }
    }
}

/// Strip the transaction envelope from revm's mainnet handler so the frame
/// starts with the full gas limit and the sender account is left alone.
fn message_call_handle_register<EXT, DB: Database>(handler: &mut EvmHandler<'_, EXT, DB>) {
    handler.validation.initial_tx_gas = Arc::new(no_intrinsic_gas::<DB>);
    handler.validation.tx_against_state = Arc::new(leave_sender::<EXT, DB>);
    handler.pre_execution.deduct_caller = Arc::new(leave_sender::<EXT, DB>);
    handler.post_execution.reimburse_caller = Arc::new(skip_settlement::<EXT, DB>);
    handler.post_execution.reward_beneficiary = Arc::new(skip_settlement::<EXT, DB>);
}

fn no_intrinsic_gas<DB: Database>(_env: &Env) -> Result<u64, EVMError<DB::Error>> {
    Ok(0)
}

fn leave_sender<EXT, DB: Database>(_ctx: &mut Context<EXT, DB>) -> Result<(), EVMError<DB::Error>> {
    Ok(())
}

fn skip_settlement<EXT, DB: Database>(
    _ctx: &mut Context<EXT, DB>,
    _gas: &Gas,
) -> Result<(), EVMError<DB::Error>> {
    Ok(())
}

impl Vm for RevmVm {
    fn create(&mut self, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput {
        self.transact(TxKind::Create, input, ctx)
    }

    fn call(&mut self, receiver: Address, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput {
        self.transact(TxKind::Call(receiver), input, ctx)
    }
}
