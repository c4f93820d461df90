use crate::cli::args::RunArgs;
use crate::profile::{self, CpuProfile};
use crate::runtime::{
    initialize, timed_exec, Dispatch, ExecContext, ExecOutput, ExecStats, ExecutionConfig,
    InitializedState, RevmVm,
};
use crate::tracer::{self, Tracer};
use alloy_primitives::Bytes;
use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::{debug, info};

/// Execute the `run` command.
pub fn run(args: RunArgs) -> Result<()> {
    let log_config = args.log_config();
    let mut tracer = Tracer::select(args.machine, args.debug, log_config, Box::new(io::stdout()));

    let InitializedState { mut state, genesis } =
        initialize(args.prestate.as_deref(), args.sender).context("Failed to initialize state")?;

    let code = args
        .code_resolver()
        .resolve()
        .context("Failed to load code")?;
    let exec_config = ExecutionConfig::new(
        &genesis,
        args.sender,
        args.gas,
        args.price,
        args.value,
        args.debug,
    );

    let cpu_profile = args
        .cpuprofile
        .as_deref()
        .map(CpuProfile::start)
        .transpose()
        .context("Failed to start CPU profile")?;

    let input = args
        .input_resolver()
        .resolve()
        .context("Failed to load input")?;

    let dispatch = Dispatch::prepare(
        args.mode(),
        Bytes::from(code),
        Bytes::from(input),
        args.receiver,
        &mut state,
    );
    info!(mode = ?args.mode(), gas = exec_config.gas_limit, "Executing");

    let mut vm = RevmVm;
    let (output, stats) = timed_exec(args.bench, || {
        let mut ctx = ExecContext {
            config: &exec_config,
            state: &mut state,
            tracer: &mut tracer,
        };
        dispatch.execute(&mut vm, &mut ctx)
    });
    debug!(?stats, "execution finished");

    if let Some(profile) = cpu_profile {
        profile.finish().context("Failed to write CPU profile")?;
    }

    if args.dump {
        let dump = serde_json::to_string_pretty(&state.dump()).context("Failed to encode state dump")?;
        println!("{}", dump);
    }

    if let Some(path) = &args.memprofile {
        profile::write_heap_profile(path).context("Failed to write memory profile")?;
    }

    let stderr = io::stderr();
    let mut err = stderr.lock();
    if exec_config.debug {
        if let Some(steps) = tracer.struct_logs() {
            writeln!(err, "#### TRACE ####")?;
            tracer::write_trace(&mut err, steps)?;
        }
        writeln!(err, "#### LOGS ####")?;
        tracer::write_logs(&mut err, state.logs(), exec_config.block_number)?;
    }

    if args.bench || args.statdump {
        let gas_used = exec_config.gas_limit.saturating_sub(output.gas_left);
        write_stats(&mut err, gas_used, &stats)?;
    }

    if !tracer.is_active() {
        let stdout = io::stdout();
        write_result(&mut stdout.lock(), &output)?;
    }
    Ok(())
}

fn write_stats(w: &mut dyn Write, gas_used: u64, stats: &ExecStats) -> io::Result<()> {
    writeln!(w, "EVM gas used:    {}", gas_used)?;
    writeln!(w, "execution time:  {:?}", stats.time)?;
    writeln!(w, "allocations:     {}", stats.allocs)?;
    writeln!(w, "allocated bytes: {}", stats.bytes_allocated)
}

fn write_result(w: &mut dyn Write, output: &ExecOutput) -> io::Result<()> {
    writeln!(w, "0x{}", hex::encode(&output.output))?;
    if let Some(e) = &output.error {
        writeln!(w, " error: {}", e)?;
    }
    Ok(())
}
