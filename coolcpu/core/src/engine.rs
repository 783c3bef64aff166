//! Block transfer engine: a guarded bulk-copy device on the extended variant.
//!
//! The engine sits behind four write-only registers. Writing GO arms it; the
//! program then has to write the poke indices 5, 4, 3, 2, 1 in order, with every
//! poke after the first landing exactly [`POKE_CYCLE_DISTANCE`] cycles after the
//! previous one. The final poke copies one [`SECTOR_SIZE`]-byte sector to DST:
//! the secret sector when SRC matches the machine's hidden magic sector, zeros
//! otherwise.

use crate::memory::{ENGINE_DST_ADDR, ENGINE_GO_ADDR, ENGINE_POKE_ADDR, ENGINE_SRC_ADDR};
use crate::Fault;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const SECTOR_SIZE: usize = 32;
pub const POKE_START_INDEX: u8 = 5;
pub const POKE_CYCLE_DISTANCE: u64 = 36;

/// Payload copied out when SRC names the magic sector.
pub const SECRET_SECTOR: [u8; SECTOR_SIZE] = *b"flag{bl0ck_tr4nsf3r_p0k3d_r1ght}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineRegister {
    Dst,
    Src,
    Go,
    Poke,
}

impl EngineRegister {
    pub fn from_addr(addr: u8) -> Option<Self> {
        match addr {
            ENGINE_DST_ADDR => Some(Self::Dst),
            ENGINE_SRC_ADDR => Some(Self::Src),
            ENGINE_GO_ADDR => Some(Self::Go),
            ENGINE_POKE_ADDR => Some(Self::Poke),
            _ => None,
        }
    }

    pub fn addr(self) -> u8 {
        match self {
            Self::Dst => ENGINE_DST_ADDR,
            Self::Src => ENGINE_SRC_ADDR,
            Self::Go => ENGINE_GO_ADDR,
            Self::Poke => ENGINE_POKE_ADDR,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dst => "DST",
            Self::Src => "SRC",
            Self::Go => "GO",
            Self::Poke => "POKE",
        }
    }
}

impl fmt::Display for EngineRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hidden sector selector. Only the engine compares against it.
#[derive(Clone, Copy, PartialEq, Eq)]
struct MagicSector(u8);

impl fmt::Debug for MagicSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MagicSector(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    Armed { index: u8, ref_cycle: u64 },
    /// The final poke was accepted and the sector copy is being written out.
    Copying,
}

/// A copy released by the final poke. The caller writes `data` starting at
/// `dst` through the normal write path and then calls
/// [`BlockTransferEngine::finish_transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub dst: u8,
    pub data: [u8; SECTOR_SIZE],
}

#[derive(Debug, Clone)]
pub struct BlockTransferEngine {
    dst: u8,
    src: u8,
    phase: EnginePhase,
    magic: MagicSector,
}

impl BlockTransferEngine {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            dst: 0,
            src: 0,
            phase: EnginePhase::Idle,
            magic: MagicSector(rng.gen()),
        }
    }

    pub fn dst(&self) -> u8 {
        self.dst
    }

    pub fn src(&self) -> u8 {
        self.src
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, EnginePhase::Idle)
    }

    /// Handle a write to one of the engine registers at `cycle`.
    pub fn write(
        &mut self,
        register: EngineRegister,
        value: u8,
        cycle: u64,
    ) -> Result<Option<Transfer>, Fault> {
        match register {
            EngineRegister::Dst | EngineRegister::Src | EngineRegister::Go if self.is_busy() => {
                Err(Fault::EngineBusy { register })
            }
            EngineRegister::Dst => {
                self.dst = value;
                Ok(None)
            }
            EngineRegister::Src => {
                self.src = value;
                Ok(None)
            }
            EngineRegister::Go => {
                debug!(dst = self.dst, cycle, "block transfer armed");
                self.phase = EnginePhase::Armed {
                    index: POKE_START_INDEX,
                    ref_cycle: cycle,
                };
                Ok(None)
            }
            EngineRegister::Poke => self.poke(value, cycle),
        }
    }

    fn poke(&mut self, value: u8, cycle: u64) -> Result<Option<Transfer>, Fault> {
        let (index, ref_cycle) = match self.phase {
            EnginePhase::Idle => return Err(Fault::EngineNotArmed),
            // A copy whose range covers POKE lands here and faults as busy
            // instead of being checked as a poke.
            EnginePhase::Copying => {
                return Err(Fault::EngineBusy {
                    register: EngineRegister::Poke,
                })
            }
            EnginePhase::Armed { index, ref_cycle } => (index, ref_cycle),
        };

        if value != index {
            return Err(Fault::EngineIndexMismatch {
                expected: index,
                got: value,
            });
        }

        if index != POKE_START_INDEX {
            let expected = ref_cycle.saturating_add(POKE_CYCLE_DISTANCE);
            if cycle < expected {
                return Err(Fault::EngineTimingEarly { expected, cycle });
            }
            if cycle > expected {
                return Err(Fault::EngineTimingLate { expected, cycle });
            }
        }

        let next = index - 1;
        debug!(index = next, cycle, "poke accepted");
        if next > 0 {
            self.phase = EnginePhase::Armed {
                index: next,
                ref_cycle: cycle,
            };
            return Ok(None);
        }

        self.phase = EnginePhase::Copying;
        let data = if self.src == self.magic.0 {
            SECRET_SECTOR
        } else {
            [0u8; SECTOR_SIZE]
        };
        Ok(Some(Transfer {
            dst: self.dst,
            data,
        }))
    }

    pub fn finish_transfer(&mut self) {
        debug!(dst = self.dst, "block transfer complete");
        self.phase = EnginePhase::Idle;
    }
}
