use crate::runtime::{CodeResolver, InputResolver, Mode};
use crate::tracer::LogConfig;
use crate::RunError;
use alloy_primitives::{Address, U256};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const ADDRESS_LEN: usize = 20;

/// Address with the ASCII bytes `sender` in its low bytes.
pub const DEFAULT_SENDER: &str = "0x000000000000000000000000000073656e646572";
/// Address with the ASCII bytes `receiver` in its low bytes.
pub const DEFAULT_RECEIVER: &str = "0x0000000000000000000000007265636569766572";

#[derive(Parser)]
#[command(name = "evm")]
#[command(about = "Run arbitrary EVM bytecode against an ephemeral state", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log verbosity (0=silent, 1=error, 2=warn, 3=info, 4=debug, 5=trace)
    #[arg(
        long,
        global = true,
        default_value_t = 3,
        env = "EVM_VERBOSITY",
        value_parser = clap::value_parser!(u8).range(0..=5)
    )]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity(self.verbosity)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run EVM code once, by calling the receiver or by creating a contract
    Run(RunArgs),
}

/// Log verbosity as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbosity(pub u8);

impl Verbosity {
    /// Level directive understood by `tracing_subscriber::EnvFilter`.
    pub fn to_log_level(self) -> &'static str {
        match self.0 {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 => "info",
            4 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Assembly source file, compiled when no hex code is supplied
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// JSON genesis file seeding the state and chain configuration
    #[arg(long, alias = "genesis", value_name = "FILE")]
    pub prestate: Option<PathBuf>,

    /// Transaction origin
    #[arg(long, env = "EVM_SENDER", default_value = DEFAULT_SENDER, value_parser = parse_address)]
    pub sender: Address,

    /// Transaction receiver (execution context)
    #[arg(long, env = "EVM_RECEIVER", default_value = DEFAULT_RECEIVER, value_parser = parse_address)]
    pub receiver: Address,

    /// EVM code as hex
    #[arg(long)]
    pub code: Option<String>,

    /// File containing EVM code as hex; `-` reads standard input
    #[arg(long, value_name = "FILE")]
    pub codefile: Option<String>,

    /// Call data as hex
    #[arg(long, default_value = "")]
    pub input: String,

    /// File containing call data as hex; overrides --input
    #[arg(long, value_name = "FILE")]
    pub inputfile: Option<PathBuf>,

    /// Deploy the code (with the input appended) instead of calling it
    #[arg(long)]
    pub create: bool,

    /// Benchmark the execution
    #[arg(long)]
    pub bench: bool,

    /// Dump the state as JSON after execution
    #[arg(long)]
    pub dump: bool,

    /// Write a CPU profile flamegraph (SVG) to the given file
    #[arg(long, value_name = "FILE")]
    pub cpuprofile: Option<PathBuf>,

    /// Write an allocation profile (JSON) to the given file
    #[arg(long, value_name = "FILE")]
    pub memprofile: Option<PathBuf>,

    /// Print execution statistics even without --bench
    #[arg(long)]
    pub statdump: bool,

    /// Gas limit for the execution
    #[arg(long, env = "EVM_GAS", default_value_t = 10_000_000_000)]
    pub gas: u64,

    /// Gas price
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub price: U256,

    /// Value to transfer with the transaction
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub value: U256,

    /// Stream each step as JSON to stdout
    #[arg(long = "json")]
    pub machine: bool,

    /// Record every step and print the trace and logs afterwards
    #[arg(long)]
    pub debug: bool,

    /// Disable memory capture
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub nomemory: bool,

    /// Disable stack capture
    #[arg(long)]
    pub nostack: bool,

    /// Disable storage capture
    #[arg(long)]
    pub nostorage: bool,

    /// Disable return data capture
    #[arg(long)]
    pub noreturndata: bool,

    /// Maximum number of recorded steps (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

impl RunArgs {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enable_memory: !self.nomemory,
            disable_stack: self.nostack,
            disable_storage: self.nostorage,
            enable_return_data: !self.noreturndata,
            debug: self.debug,
            limit: self.limit,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.create {
            Mode::Create
        } else {
            Mode::Call
        }
    }

    pub fn code_resolver(&self) -> CodeResolver {
        CodeResolver::from_flags(
            self.code.as_deref(),
            self.codefile.as_deref(),
            self.source.as_deref(),
        )
    }

    pub fn input_resolver(&self) -> InputResolver {
        InputResolver::from_flags(self.inputfile.as_deref(), &self.input)
    }
}

/// Parse an address leniently: optional `0x`, an odd digit count gets a
/// leading zero, short values are left padded and long values keep their
/// low 20 bytes.
pub fn parse_address(s: &str) -> Result<Address, RunError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(padded).map_err(|e| RunError::InvalidAddress(format!("{}: {}", s, e)))?;
    let start = bytes.len().saturating_sub(ADDRESS_LEN);
    Ok(Address::left_padding_from(&bytes[start..]))
}

/// Decimal or `0x`-prefixed hex quantity.
pub fn parse_u256(s: &str) -> Result<U256, String> {
    s.trim()
        .parse::<U256>()
        .map_err(|e| format!("invalid quantity {:?}: {}", s, e))
}
