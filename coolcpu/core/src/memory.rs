//! Address map and backing storage for the ROM and RAM banks.
//!
//! The CPU sees a single flat 8-bit address space:
//!
//! | range        | region                                   |
//! |--------------|------------------------------------------|
//! | `0x00..0x80` | ROM (writes fault)                       |
//! | `0x80..0xF0` | RAM                                      |
//! | `0xF1`       | OUTPUT (write-only)                      |
//! | `0xF2..0xF6` | block transfer engine (extended variant) |
//!
//! Everything else is unmapped.

use crate::engine::EngineRegister;
use crate::{CoreError, Result, Variant};

pub const ROM_SIZE: usize = 0x80;
pub const RAM_START: u8 = 0x80;
/// First address past the end of RAM.
pub const RAM_END: u8 = 0xF0;
pub const RAM_SIZE: usize = (RAM_END - RAM_START) as usize;

pub const OUTPUT_ADDR: u8 = 0xF1;
pub const ENGINE_DST_ADDR: u8 = 0xF2;
pub const ENGINE_SRC_ADDR: u8 = 0xF3;
pub const ENGINE_GO_ADDR: u8 = 0xF4;
pub const ENGINE_POKE_ADDR: u8 = 0xF5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Offset into the ROM bank.
    Rom(usize),
    /// Offset into the RAM bank.
    Ram(usize),
    Output,
    Engine(EngineRegister),
    Unmapped,
}

/// Classify `addr` for the given machine variant.
pub fn region(variant: Variant, addr: u8) -> Region {
    match addr {
        0x00..=0x7F => Region::Rom(addr as usize),
        RAM_START..=0xEF => Region::Ram((addr - RAM_START) as usize),
        OUTPUT_ADDR => Region::Output,
        ENGINE_DST_ADDR..=ENGINE_POKE_ADDR if variant == Variant::Extended => {
            match EngineRegister::from_addr(addr) {
                Some(reg) => Region::Engine(reg),
                None => Region::Unmapped,
            }
        }
        _ => Region::Unmapped,
    }
}

#[derive(Clone)]
pub struct MemoryImage {
    rom: [u8; ROM_SIZE],
    ram: [u8; RAM_SIZE],
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImage")
            .field("rom_len", &ROM_SIZE)
            .field("ram_len", &RAM_SIZE)
            .finish()
    }
}

impl MemoryImage {
    pub fn new() -> Self {
        Self {
            rom: [0u8; ROM_SIZE],
            ram: [0u8; RAM_SIZE],
        }
    }

    /// Build an image whose ROM starts with `blob`; the rest is zero-filled.
    pub fn with_rom(blob: &[u8]) -> Result<Self> {
        if blob.len() > ROM_SIZE {
            return Err(CoreError::RomTooLarge {
                len: blob.len(),
                max: ROM_SIZE,
            });
        }
        let mut image = Self::new();
        image.rom[..blob.len()].copy_from_slice(blob);
        Ok(image)
    }

    /// Copy `bytes` into RAM starting at absolute address `addr`.
    ///
    /// Used by hosts to pre-seed memory before a run; the whole span must sit
    /// inside the RAM bank.
    pub fn load_ram(&mut self, addr: u8, bytes: &[u8]) -> Result<()> {
        let start = addr as usize;
        let end = start + bytes.len();
        if start < RAM_START as usize || end > RAM_END as usize {
            return Err(CoreError::OutsideRam {
                addr,
                len: bytes.len(),
            });
        }
        let offset = start - RAM_START as usize;
        self.ram[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Side-effect-free read of ROM or RAM. Device addresses return `None`.
    pub fn read_byte(&self, addr: u8) -> Option<u8> {
        match addr {
            0x00..=0x7F => Some(self.rom[addr as usize]),
            RAM_START..=0xEF => Some(self.ram[(addr - RAM_START) as usize]),
            _ => None,
        }
    }

    pub(crate) fn rom_byte(&self, offset: usize) -> u8 {
        self.rom[offset]
    }

    pub(crate) fn ram_byte(&self, offset: usize) -> u8 {
        self.ram[offset]
    }

    pub(crate) fn set_ram_byte(&mut self, offset: usize, value: u8) {
        self.ram[offset] = value;
    }
}
