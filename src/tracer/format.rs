//! Text rendering of captured steps and emitted logs for `--debug`.

use super::{word_hex, StructLog};
use revm::primitives::Log;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Write each recorded step followed by its stack, memory, storage and return
/// data sections.
pub fn write_trace(w: &mut dyn Write, logs: &[StructLog]) -> io::Result<()> {
    for log in logs {
        write!(
            w,
            "{:<16}pc={:08} gas={} cost={}",
            log.op_name, log.pc, log.gas, log.gas_cost
        )?;
        if let Some(err) = &log.error {
            write!(w, " ERROR: {}", err)?;
        }
        writeln!(w)?;

        if let Some(stack) = log.stack.as_ref().filter(|s| !s.is_empty()) {
            writeln!(w, "Stack:")?;
            for (i, word) in stack.iter().rev().enumerate() {
                writeln!(w, "{:08}  {}", i, word_hex(word))?;
            }
        }
        if let Some(memory) = log.memory.as_ref().filter(|m| !m.is_empty()) {
            writeln!(w, "Memory:")?;
            w.write_all(hex_dump(memory).as_bytes())?;
        }
        if let Some(storage) = log.storage.as_ref().filter(|s| !s.is_empty()) {
            writeln!(w, "Storage:")?;
            for (key, value) in storage {
                writeln!(w, "{}: {}", hex::encode(key), hex::encode(value))?;
            }
        }
        if let Some(data) = log.return_data.as_ref().filter(|r| !r.is_empty()) {
            writeln!(w, "ReturnData:")?;
            w.write_all(hex_dump(data).as_bytes())?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Write the logs emitted during execution.
pub fn write_logs(w: &mut dyn Write, logs: &[Log], block_number: u64) -> io::Result<()> {
    for log in logs {
        let topics = log.data.topics();
        writeln!(
            w,
            "LOG{}: {} bn={} txi=0",
            topics.len(),
            hex::encode(log.address),
            block_number
        )?;
        for (i, topic) in topics.iter().enumerate() {
            writeln!(w, "{:08}  {}", i, hex::encode(topic))?;
        }
        w.write_all(hex_dump(&log.data.data).as_bytes())?;
        writeln!(w)?;
    }
    Ok(())
}

/// Canonical hex+ASCII dump, 16 bytes per line.
///
/// ```
/// let dump = evm_runner::tracer::hex_dump(b"`\x00R");
/// assert!(dump.starts_with("00000000  60 00 52 "));
/// assert!(dump.ends_with("|`.R|\n"));
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", line * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(out, "{:02x} ", byte);
                }
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        out.extend(chunk.iter().map(|&b| {
            if (0x20..=0x7e).contains(&b) {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }
    out
}
