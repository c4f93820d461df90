//! CPU and heap profiling artifacts.
//!
//! The CPU profile samples the process with `pprof` and renders a flamegraph
//! SVG. It is written when [`CpuProfile::finish`] is called, or when the guard
//! is dropped on an early return. The heap profile is a JSON snapshot of the
//! counting allocator.

use crate::alloc::{self, AllocSnapshot};
use crate::{Result, RunError};
use pprof::{ProfilerGuard, ProfilerGuardBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SAMPLE_FREQUENCY: i32 = 1000;

/// Scoped CPU profile. Sampling stops and the flamegraph is written when the
/// guard is finished or dropped.
pub struct CpuProfile {
    path: PathBuf,
    file: Option<File>,
    guard: Option<ProfilerGuard<'static>>,
}

impl CpuProfile {
    /// Create the output file, then start sampling.
    pub fn start(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            RunError::Profile(format!("could not create CPU profile {}: {}", path.display(), e))
        })?;
        let guard = ProfilerGuardBuilder::default()
            .frequency(SAMPLE_FREQUENCY)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(|e| RunError::Profile(format!("could not start CPU profile: {}", e)))?;
        info!(path = %path.display(), "CPU profiling started");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            guard: Some(guard),
        })
    }

    /// Stop sampling and write the flamegraph.
    pub fn finish(mut self) -> Result<()> {
        self.write()
    }

    fn write(&mut self) -> Result<()> {
        let (Some(guard), Some(file)) = (self.guard.take(), self.file.take()) else {
            return Ok(());
        };
        let report = guard
            .report()
            .build()
            .map_err(|e| RunError::Profile(format!("could not build CPU profile: {}", e)))?;
        drop(guard);
        if report.data.is_empty() {
            warn!(path = %self.path.display(), "CPU profile captured no samples");
            return Ok(());
        }
        report
            .flamegraph(file)
            .map_err(|e| RunError::Profile(format!("could not write CPU profile: {}", e)))?;
        info!(path = %self.path.display(), "CPU profile written");
        Ok(())
    }
}

impl Drop for CpuProfile {
    fn drop(&mut self) {
        if let Err(e) = self.write() {
            warn!("{}", e);
        }
    }
}

#[derive(Debug, Serialize)]
struct HeapProfile {
    #[serde(flatten)]
    counters: AllocSnapshot,
    live_bytes: u64,
}

/// Write the allocator counters as pretty JSON.
pub fn write_heap_profile(path: &Path) -> Result<()> {
    let counters = alloc::snapshot();
    let profile = HeapProfile {
        counters,
        live_bytes: counters.live_bytes(),
    };
    let mut file = File::create(path).map_err(|e| {
        RunError::Profile(format!("could not create memory profile {}: {}", path.display(), e))
    })?;
    serde_json::to_writer_pretty(&mut file, &profile)
        .map_err(std::io::Error::from)
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| RunError::Profile(format!("could not write memory profile: {}", e)))?;
    info!(path = %path.display(), "memory profile written");
    Ok(())
}
