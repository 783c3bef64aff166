//! Linear-sweep disassembler for CoolCPU program images.

use crate::opcode::{decode_opcode, OpcodeMetadata, OperandKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("illegal opcode 0x{0:02X}")]
    IllegalOpcode(u8),
    #[error("{mnemonic} at end of image is missing its operand byte")]
    Truncated { mnemonic: &'static str },
    #[error("empty image")]
    Empty,
}

/// One decoded instruction: its table entry plus the operand byte, if any.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub meta: &'static OpcodeMetadata,
    pub operand: Option<u8>,
}

impl Instruction {
    /// Decode the instruction at the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let opcode = *bytes.first().ok_or(DecodeError::Empty)?;
        let meta = decode_opcode(opcode).ok_or(DecodeError::IllegalOpcode(opcode))?;
        let operand = match meta.operand {
            OperandKind::None => None,
            OperandKind::Addr | OperandKind::Imm => Some(*bytes.get(1).ok_or(
                DecodeError::Truncated {
                    mnemonic: meta.mnemonic,
                },
            )?),
        };
        Ok(Self { meta, operand })
    }

    pub fn size(&self) -> usize {
        self.meta.length as usize
    }

    pub fn text(&self) -> String {
        self.meta.render(self.operand)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisasmLine {
    pub addr: u8,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Sweep `image` from the start, treating its first byte as address `origin`.
///
/// Bytes that do not decode are emitted as `.db` data lines and the sweep
/// resumes at the next byte.
pub fn disassemble(image: &[u8], origin: u8) -> Vec<DisasmLine> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    while offset < image.len() {
        let addr = origin.wrapping_add(offset as u8);
        match Instruction::decode(&image[offset..]) {
            Ok(instr) => {
                let end = offset + instr.size();
                lines.push(DisasmLine {
                    addr,
                    bytes: image[offset..end].to_vec(),
                    text: instr.text(),
                });
                offset = end;
            }
            Err(_) => {
                let byte = image[offset];
                lines.push(DisasmLine {
                    addr,
                    bytes: vec![byte],
                    text: format!(".db 0x{byte:02X}"),
                });
                offset += 1;
            }
        }
    }
    lines
}

/// Render a listing as `addr  bytes  text`, one instruction per line.
pub fn listing(image: &[u8], origin: u8) -> String {
    let lines = disassemble(image, origin);
    if lines.is_empty() {
        return "(empty program)\n".to_string();
    }
    let mut out = String::new();
    for line in lines {
        let bytes = line
            .bytes
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("{:02X}  {:<6} {}\n", line.addr, bytes, line.text));
    }
    out
}
