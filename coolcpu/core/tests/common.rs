#![allow(dead_code)]

use coolcpu_core::{Machine, Variant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SEED: u64 = 0xC001_C0DE;

/// Bytes between two pokes that keep them exactly 36 cycles apart:
/// `STA`(1) + `CON`(1) + 17 x `LDB [A]`(2) = 36.
pub const ON_TIME: [u8; 17] = [0x05; 17];
/// One cycle short of the window.
pub fn early_padding() -> Vec<u8> {
    let mut pad = vec![0x05; 16];
    pad.push(0x00);
    pad
}

/// One cycle past the window.
pub fn late_padding() -> Vec<u8> {
    let mut pad = vec![0x05; 17];
    pad.push(0x00);
    pad
}

/// The magic sector an extended machine built by [`extended_machine`] draws.
pub fn magic() -> u8 {
    StdRng::seed_from_u64(SEED).gen()
}

pub fn base_machine(rom: &[u8]) -> Machine {
    Machine::new(Variant::Base, rom).expect("rom fits")
}

pub fn extended_machine(rom: &[u8]) -> Machine {
    Machine::with_rng(Variant::Extended, rom, &mut StdRng::seed_from_u64(SEED)).expect("rom fits")
}

/// Program that sets DST/SRC, arms the engine and pokes 5..1, with `padding`
/// between consecutive pokes. Ends with HCF.
///
/// GO is written at cycle 4 and the first poke lands at cycle 6.
pub fn transfer_program(src: u8, dst: u8, padding: &[u8]) -> Vec<u8> {
    let mut rom = vec![
        0x22, dst, // CON dst
        0x11, 0xF2, // STA DST
        0x22, src, // CON src
        0x11, 0xF3, // STA SRC
        0x11, 0xF4, // STA GO
        0x22, 0x05, // CON 5
        0x11, 0xF5, // STA POKE
    ];
    for index in (1..=4u8).rev() {
        rom.extend_from_slice(&[0x22, index]);
        rom.extend_from_slice(padding);
        rom.extend_from_slice(&[0x11, 0xF5]);
    }
    rom.push(0xFF);
    rom
}

/// Prints the NUL-terminated string at RAM 0x93 to OUTPUT, then halts.
pub const PRINT_AT_0X93: &str = "22934141054140311011f14120413003ff";
