//! Single-shot EVM execution harness.
//!
//! `evm-runner` resolves bytecode and call data from the command line, builds
//! an ephemeral account state, dispatches one create or call through
//! [`revm`], and reports the result with optional tracing, profiling and
//! benchmark statistics.

pub mod alloc;
pub mod asm;
pub mod cli;
pub mod error;
pub mod profile;
pub mod runtime;
pub mod tracer;

pub use error::{Result, RunError};
