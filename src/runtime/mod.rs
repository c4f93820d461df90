//! Runtime execution sub-system.
//!
//! Sub-modules:
//! - [`source`]   : code and call-data resolution from flags, files and stdin.
//! - [`genesis`]  : genesis file parsing and fork selection.
//! - [`state`]    : the in-memory account state and its JSON dump.
//! - [`executor`] : execution parameters and the [`Vm`] seam over revm.
//! - [`dispatch`] : create/call preparation against the state.
//! - [`result`]   : execution outcome types.
//! - [`stats`]    : timing, allocation counting and benchmark calibration.

pub mod dispatch;
pub mod executor;
pub mod genesis;
pub mod result;
pub mod source;
pub mod state;
pub mod stats;

pub use dispatch::{Dispatch, Mode};
pub use executor::{initial_gas, ExecContext, ExecutionConfig, RevmVm, Vm};
pub use genesis::{read_genesis, ChainConfig, Genesis, GenesisAccount};
pub use result::{ExecOutput, VmError};
pub use source::{decode_hex, CodeResolver, CodeSource, InputResolver, InputSource};
pub use state::{initialize, InitializedState, StateDump, StateStore};
pub use stats::{timed_exec, timed_exec_with, BenchReport, Benchmark, ExecStats};
