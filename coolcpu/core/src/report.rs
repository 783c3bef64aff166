//! Final run report: outcome, captured output and machine state.

use crate::runtime::RunOutcome;
use crate::snapshot::Snapshot;
use crate::{Variant, RAM_START};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub variant: Variant,
    pub outcome: RunOutcome,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub output: Vec<u8>,
    pub output_text: String,
    pub snapshot: Snapshot,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn new(outcome: RunOutcome, output: Vec<u8>, snapshot: Snapshot, elapsed_ms: u64) -> Self {
        let output_text = String::from_utf8_lossy(&output).into_owned();
        Self {
            variant: snapshot.variant,
            outcome,
            output,
            output_text,
            snapshot,
            elapsed_ms,
        }
    }

    pub fn outcome_line(&self) -> String {
        match self.outcome {
            RunOutcome::Halted => "halted".to_string(),
            RunOutcome::Fault(fault) => format!("fault: {fault}"),
            RunOutcome::Cancelled => "timed out".to_string(),
        }
    }

    /// Process exit code for CLI hosts: 0 halted, 1 fault, 2 cancelled.
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            RunOutcome::Halted => 0,
            RunOutcome::Fault(_) => 1,
            RunOutcome::Cancelled => 2,
        }
    }

    pub fn render_text(&self) -> String {
        let snap = &self.snapshot;
        let regs = snap.registers;
        let mut out = String::new();
        let _ = writeln!(out, "CoolCPU ({}) {}", self.variant, self.outcome_line());
        let _ = writeln!(
            out,
            "PC={:02x} A={:02x} B={:02x} C={:02x} cycles={}",
            regs.pc, regs.a, regs.b, regs.c, snap.cycle
        );
        if let Some(engine) = &snap.engine {
            let _ = writeln!(
                out,
                "DST={:02x} SRC={:02x} engine={:?}",
                engine.dst, engine.src, engine.phase
            );
        }
        let _ = writeln!(out, "\nOutput:\n{}", self.output_text);
        let _ = writeln!(out, "\nROM:\n{}", hexdump(&snap.rom, 0));
        let _ = writeln!(out, "RAM:\n{}", hexdump(&snap.ram, RAM_START as usize));
        out
    }
}

/// Canonical hex+ASCII dump, 16 bytes per line, offsets starting at `base`.
pub fn hexdump(data: &[u8], base: usize) -> String {
    let mut out = String::new();
    for (line, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", base + line * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(out, "{byte:02x} ");
                }
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        for byte in chunk {
            let printable = byte.is_ascii_graphic() || *byte == b' ';
            out.push(if printable { *byte as char } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}
