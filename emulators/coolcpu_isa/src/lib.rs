pub mod disasm;
pub mod opcode;

pub use disasm::{disassemble, listing, DecodeError, DisasmLine, Instruction};
pub use opcode::{all_opcodes, decode_opcode, AddrMode, Op, OpcodeMetadata, OperandKind, Reg};
