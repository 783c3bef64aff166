//! CoolCPU core: an 8-bit register machine with memory-mapped output and, on
//! the extended variant, a timing-gated block transfer engine.
//!
//! A [`Machine`] is built from a ROM image, then driven either one instruction
//! at a time with [`Machine::step`] or to completion with [`Machine::run`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod clock;
pub mod engine;
pub mod exec;
pub mod host;
pub mod memory;
pub mod report;
pub mod runtime;
pub mod snapshot;
pub mod state;

pub use clock::CycleClock;
pub use engine::{
    BlockTransferEngine, EnginePhase, EngineRegister, Transfer, POKE_CYCLE_DISTANCE,
    POKE_START_INDEX, SECRET_SECTOR, SECTOR_SIZE,
};
pub use exec::{execute, Bus, Executed, MachineBus, StepOutcome};
pub use host::{decode_program, HostConfig, Session, BASE_SECRET, BASE_SECRET_ADDR};
pub use memory::{
    region, MemoryImage, Region, ENGINE_DST_ADDR, ENGINE_GO_ADDR, ENGINE_POKE_ADDR,
    ENGINE_SRC_ADDR, OUTPUT_ADDR, RAM_END, RAM_SIZE, RAM_START, ROM_SIZE,
};
pub use report::{hexdump, RunReport};
pub use runtime::{
    CancelFlag, CancelSignal, Deadline, FnSink, NeverCancel, NullSink, OutputSink, RunOutcome,
};
pub use snapshot::{EngineSnapshot, Snapshot};
pub use state::Registers;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while preparing a machine, before any instruction executes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("program is {len} bytes; ROM holds at most {max}")]
    RomTooLarge { len: usize, max: usize },
    #[error("program is empty")]
    EmptyProgram,
    #[error("program is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("{len} bytes at 0x{addr:02X} do not fit in RAM")]
    OutsideRam { addr: u8, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read from"),
            Access::Write => f.write_str("write to"),
        }
    }
}

/// A terminal error raised by a single instruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    #[error("tried to {access} out of bounds address 0x{addr:02X}")]
    IllegalAddress { addr: u8, access: Access },
    #[error("tried to write to ROM at 0x{addr:02X}")]
    ProtectedWrite { addr: u8 },
    #[error("tried to run illegal instruction 0x{opcode:02X} at 0x{pc:02X}")]
    IllegalInstruction { opcode: u8, pc: u8 },
    #[error("cannot write {register} while a block transfer is in progress")]
    EngineBusy { register: EngineRegister },
    #[error("tried to poke without a block transfer in progress")]
    EngineNotArmed,
    #[error("incorrect poke index; expected {expected}, got {got}")]
    EngineIndexMismatch { expected: u8, got: u8 },
    #[error("poke was too early (cycle {cycle}, expected {expected})")]
    EngineTimingEarly { expected: u64, cycle: u64 },
    #[error("poke was too late (cycle {cycle}, expected {expected})")]
    EngineTimingLate { expected: u64, cycle: u64 },
}

impl Fault {
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::IllegalAddress { .. } => "IllegalAddress",
            Fault::ProtectedWrite { .. } => "ProtectedWrite",
            Fault::IllegalInstruction { .. } => "IllegalInstruction",
            Fault::EngineBusy { .. } => "EngineBusy",
            Fault::EngineNotArmed => "EngineNotArmed",
            Fault::EngineIndexMismatch { .. } => "EngineIndexMismatch",
            Fault::EngineTimingEarly { .. } => "EngineTimingEarly",
            Fault::EngineTimingLate { .. } => "EngineTimingLate",
        }
    }
}

/// Machine variants. The extended variant adds the block transfer engine; the
/// instruction set is shared.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    #[cfg_attr(feature = "cli", value(alias = "1"))]
    Base,
    #[cfg_attr(feature = "cli", value(alias = "2"))]
    Extended,
}

impl Variant {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "base" | "1" | "v1" => Some(Self::Base),
            "extended" | "2" | "v2" => Some(Self::Extended),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Extended => "extended",
        }
    }

    pub fn has_engine(self) -> bool {
        matches!(self, Self::Extended)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One CoolCPU instance. Owns all of its state; never shared between runs.
#[derive(Debug)]
pub struct Machine {
    variant: Variant,
    memory: MemoryImage,
    regs: Registers,
    clock: CycleClock,
    halted: bool,
    fault: Option<Fault>,
    engine: Option<BlockTransferEngine>,
}

impl Machine {
    /// Build a machine with zeroed RAM and registers. The extended variant
    /// draws its magic sector from the thread RNG.
    pub fn new(variant: Variant, rom: &[u8]) -> Result<Self> {
        Self::with_rng(variant, rom, &mut rand::thread_rng())
    }

    /// Like [`Machine::new`] but draws the magic sector from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(variant: Variant, rom: &[u8], rng: &mut R) -> Result<Self> {
        let memory = MemoryImage::with_rom(rom)?;
        let engine = variant.has_engine().then(|| BlockTransferEngine::new(rng));
        Ok(Self {
            variant,
            memory,
            regs: Registers::default(),
            clock: CycleClock::new(),
            halted: false,
            fault: None,
            engine,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Overwrite the register file. Intended for harnesses that single-step
    /// from a prepared state.
    pub fn set_registers(&mut self, regs: Registers) {
        self.regs = regs;
    }

    pub fn a(&self) -> u8 {
        self.regs.a
    }

    pub fn b(&self) -> u8 {
        self.regs.b
    }

    pub fn c(&self) -> u8 {
        self.regs.c
    }

    pub fn pc(&self) -> u8 {
        self.regs.pc
    }

    pub fn cycle(&self) -> u64 {
        self.clock.now()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The fault that stopped this machine, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    /// Mutable access for pre-seeding RAM. ROM has no write API.
    pub fn memory_mut(&mut self) -> &mut MemoryImage {
        &mut self.memory
    }

    pub fn engine(&self) -> Option<&BlockTransferEngine> {
        self.engine.as_ref()
    }

    /// Read ROM or RAM without side effects. Device registers return `None`.
    pub fn peek(&self, addr: u8) -> Option<u8> {
        self.memory.read_byte(addr)
    }
}
