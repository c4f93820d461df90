//! Timing and allocation measurement around the unit of work.
//!
//! Normal mode runs the work once between two allocator snapshots. Benchmark
//! mode runs it in rounds of growing size until a round lasts at least the
//! target window, then reports per-iteration averages from that final round.
//!
//! Benchmark rounds share the same state store: whatever one iteration writes
//! is visible to the next. Only the last iteration's output is returned, so a
//! benchmarked result is a timing figure, not a correctness reference.

use crate::alloc;
use crate::runtime::ExecOutput;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_BENCH_TARGET: Duration = Duration::from_secs(1);
const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Observed cost of the dispatched execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecStats {
    /// Wall-clock time (per iteration in benchmark mode).
    pub time: Duration,
    /// Heap allocations (per iteration in benchmark mode).
    pub allocs: u64,
    /// Bytes allocated (per iteration in benchmark mode).
    pub bytes_allocated: u64,
}

/// Calibrated repeat-until-stable measurement.
#[derive(Debug, Clone, Copy)]
pub struct Benchmark {
    target: Duration,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            target: DEFAULT_BENCH_TARGET,
        }
    }
}

/// Figures from the final benchmark round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchReport {
    pub iterations: u64,
    pub total: Duration,
    pub stats: ExecStats,
}

impl Benchmark {
    pub fn with_target(target: Duration) -> Self {
        Self { target }
    }

    /// Run `work` in rounds until one round takes at least the target time.
    ///
    /// Returns the output of the very last invocation and the final round's
    /// averages.
    pub fn run<F>(&self, mut work: F) -> (ExecOutput, BenchReport)
    where
        F: FnMut() -> ExecOutput,
    {
        let mut last = ExecOutput::default();
        let mut n = 1u64;
        let mut round = run_round(n, &mut work, &mut last);

        while round.total < self.target && n < MAX_ITERATIONS {
            let previous = n;
            let elapsed_ns = round.total.as_nanos().max(1);
            let predicted = (self.target.as_nanos() * previous as u128 / elapsed_ns)
                .min(u64::MAX as u128) as u64;
            n = predicted.saturating_add(predicted / 5);
            n = n.min(previous.saturating_mul(100));
            n = n.max(previous + 1);
            n = n.min(MAX_ITERATIONS);
            debug!(iterations = n, "benchmark round");
            round = run_round(n, &mut work, &mut last);
        }

        (last, round)
    }
}

fn run_round<F>(n: u64, work: &mut F, last: &mut ExecOutput) -> BenchReport
where
    F: FnMut() -> ExecOutput,
{
    let before = alloc::snapshot();
    let start = Instant::now();
    for _ in 0..n {
        *last = work();
    }
    let total = start.elapsed();
    let delta = alloc::snapshot().since(&before);

    BenchReport {
        iterations: n,
        total,
        stats: ExecStats {
            time: Duration::from_nanos((total.as_nanos() / n as u128) as u64),
            allocs: delta.allocations / n,
            bytes_allocated: delta.bytes_allocated / n,
        },
    }
}

/// Execute `work` once, or as a benchmark when `bench` is set.
pub fn timed_exec<F>(bench: bool, work: F) -> (ExecOutput, ExecStats)
where
    F: FnMut() -> ExecOutput,
{
    if bench {
        timed_exec_with(Some(Benchmark::default()), work)
    } else {
        timed_exec_with(None, work)
    }
}

pub fn timed_exec_with<F>(bench: Option<Benchmark>, mut work: F) -> (ExecOutput, ExecStats)
where
    F: FnMut() -> ExecOutput,
{
    match bench {
        Some(benchmark) => {
            let (output, report) = benchmark.run(work);
            debug!(
                iterations = report.iterations,
                total = ?report.total,
                "benchmark finished"
            );
            (output, report.stats)
        }
        None => {
            let before = alloc::snapshot();
            let start = Instant::now();
            let output = work();
            let time = start.elapsed();
            let delta = alloc::snapshot().since(&before);
            (
                output,
                ExecStats {
                    time,
                    allocs: delta.allocations,
                    bytes_allocated: delta.bytes_allocated,
                },
            )
        }
    }
}
