//! Opcode metadata for the CoolCPU instruction set.
//!
//! Every opcode is one byte, optionally followed by a single operand byte. The
//! table below is the single source of truth for sizes and cycle costs; the
//! executor and the disassembler both read from it.

use serde::{Deserialize, Serialize};

/// General-purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reg {
    A,
    B,
    C,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::A => "A",
            Reg::B => "B",
            Reg::C => "C",
        }
    }
}

/// How a load/store finds its memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddrMode {
    /// Address is the operand byte at `pc+1`.
    Direct,
    /// Address is the current value of A.
    IndirectA,
}

/// What the byte after the opcode means, if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandKind {
    None,
    Addr,
    Imm,
}

/// Decoded operation, independent of the encoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Nop,
    Load { reg: Reg, mode: AddrMode },
    Store { reg: Reg, mode: AddrMode },
    Inc,
    Dec,
    Con,
    Jp,
    Jz,
    Jnz,
    Swap { reg: Reg },
    Halt,
}

#[derive(Debug)]
pub struct OpcodeMetadata {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub op: Op,
    pub operand: OperandKind,
    pub length: u8,
    pub cycles: u8,
}

const fn entry(
    opcode: u8,
    mnemonic: &'static str,
    op: Op,
    operand: OperandKind,
    cycles: u8,
) -> OpcodeMetadata {
    let length = match operand {
        OperandKind::None => 1,
        OperandKind::Addr | OperandKind::Imm => 2,
    };
    OpcodeMetadata {
        opcode,
        mnemonic,
        op,
        operand,
        length,
        cycles,
    }
}

use self::AddrMode::{Direct, IndirectA};
use self::OperandKind as K;

pub static OPCODES: [OpcodeMetadata; 22] = [
    entry(0x00, "NOP", Op::Nop, K::None, 1),
    entry(0x01, "LDA", Op::Load { reg: Reg::A, mode: Direct }, K::Addr, 1),
    entry(0x02, "LDB", Op::Load { reg: Reg::B, mode: Direct }, K::Addr, 1),
    entry(0x03, "LDC", Op::Load { reg: Reg::C, mode: Direct }, K::Addr, 1),
    entry(0x04, "LDA", Op::Load { reg: Reg::A, mode: IndirectA }, K::None, 2),
    entry(0x05, "LDB", Op::Load { reg: Reg::B, mode: IndirectA }, K::None, 2),
    entry(0x06, "LDC", Op::Load { reg: Reg::C, mode: IndirectA }, K::None, 2),
    entry(0x11, "STA", Op::Store { reg: Reg::A, mode: Direct }, K::Addr, 1),
    entry(0x12, "STB", Op::Store { reg: Reg::B, mode: Direct }, K::Addr, 1),
    entry(0x13, "STC", Op::Store { reg: Reg::C, mode: Direct }, K::Addr, 1),
    entry(0x14, "STA", Op::Store { reg: Reg::A, mode: IndirectA }, K::None, 2),
    entry(0x15, "STB", Op::Store { reg: Reg::B, mode: IndirectA }, K::None, 2),
    entry(0x16, "STC", Op::Store { reg: Reg::C, mode: IndirectA }, K::None, 2),
    entry(0x20, "INC", Op::Inc, K::None, 2),
    entry(0x21, "DEC", Op::Dec, K::None, 2),
    entry(0x22, "CON", Op::Con, K::Imm, 1),
    entry(0x30, "JP", Op::Jp, K::Addr, 2),
    entry(0x31, "JZ", Op::Jz, K::Addr, 3),
    entry(0x32, "JNZ", Op::Jnz, K::Addr, 3),
    entry(0x40, "SWB", Op::Swap { reg: Reg::B }, K::None, 1),
    entry(0x41, "SWC", Op::Swap { reg: Reg::C }, K::None, 1),
    entry(0xFF, "HCF", Op::Halt, K::None, 1),
];

/// Look up an opcode byte. Returns `None` for bytes outside the instruction set.
pub fn decode_opcode(opcode: u8) -> Option<&'static OpcodeMetadata> {
    OPCODES.iter().find(|entry| entry.opcode == opcode)
}

/// Iterate over every defined opcode in ascending byte order.
pub fn all_opcodes() -> impl Iterator<Item = &'static OpcodeMetadata> {
    OPCODES.iter()
}

impl OpcodeMetadata {
    /// Render the instruction with an optional operand byte.
    pub fn render(&self, operand: Option<u8>) -> String {
        match (self.operand, self.op) {
            (K::None, Op::Load { .. } | Op::Store { .. }) => format!("{} [A]", self.mnemonic),
            (K::None, _) => self.mnemonic.to_string(),
            (K::Addr, _) => match operand {
                Some(value) => format!("{} 0x{value:02X}", self.mnemonic),
                None => format!("{} ?", self.mnemonic),
            },
            (K::Imm, _) => match operand {
                Some(value) => format!("{} #0x{value:02X}", self.mnemonic),
                None => format!("{} #?", self.mnemonic),
            },
        }
    }
}
