//! Externally visible machine state, for reports and JSON output.
//!
//! The engine's magic sector never appears here.

use crate::engine::EnginePhase;
use crate::state::Registers;
use crate::{Fault, Machine, Variant};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    pub dst: u8,
    pub src: u8,
    pub phase: EnginePhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub variant: Variant,
    pub registers: Registers,
    pub cycle: u64,
    pub halted: bool,
    pub fault: Option<Fault>,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub rom: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub ram: Vec<u8>,
    pub engine: Option<EngineSnapshot>,
}

impl Machine {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            variant: self.variant,
            registers: self.regs,
            cycle: self.clock.now(),
            halted: self.halted,
            fault: self.fault,
            rom: self.memory.rom().to_vec(),
            ram: self.memory.ram().to_vec(),
            engine: self.engine.as_ref().map(|engine| EngineSnapshot {
                dst: engine.dst(),
                src: engine.src(),
                phase: engine.phase(),
            }),
        }
    }
}
