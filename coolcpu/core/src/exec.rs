//! Fetch-decode-execute for a single instruction.

use crate::engine::BlockTransferEngine;
use crate::memory::{region, MemoryImage, Region};
use crate::runtime::OutputSink;
use crate::state::Registers;
use crate::{Access, Fault, Machine, Variant};
use coolcpu_isa::{decode_opcode, AddrMode, Op};
use tracing::{debug, trace};

/// Byte-wide view of the address space as seen by the executor.
pub trait Bus {
    fn load(&mut self, addr: u8) -> Result<u8, Fault>;
    fn store(&mut self, addr: u8, value: u8) -> Result<(), Fault>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    pub opcode: u8,
    pub cycles: u8,
    pub halted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

/// Execute the instruction at `regs.pc` against `bus`.
///
/// On success the register file holds the post-instruction state, including the
/// new PC. Every bus access happens before any register is written, so a fault
/// leaves `regs` as it was. Bus side effects (OUTPUT bytes, RAM written by a
/// block transfer) are not rolled back.
pub fn execute<B: Bus + ?Sized>(regs: &mut Registers, bus: &mut B) -> Result<Executed, Fault> {
    let pc = regs.pc;
    let opcode = bus.load(pc)?;
    let meta = decode_opcode(opcode).ok_or(Fault::IllegalInstruction { opcode, pc })?;
    let operand_addr = pc.wrapping_add(1);
    let mut next_pc = pc.wrapping_add(meta.length);
    let mut halted = false;

    match meta.op {
        Op::Nop => {}
        Op::Load { reg, mode } => {
            let addr = effective_addr(mode, regs, bus, operand_addr)?;
            let value = bus.load(addr)?;
            regs.set(reg, value);
        }
        Op::Store { reg, mode } => {
            let addr = effective_addr(mode, regs, bus, operand_addr)?;
            bus.store(addr, regs.get(reg))?;
        }
        Op::Inc => regs.a = regs.a.wrapping_add(1),
        Op::Dec => regs.a = regs.a.wrapping_sub(1),
        Op::Con => regs.a = bus.load(operand_addr)?,
        Op::Jp => next_pc = bus.load(operand_addr)?,
        Op::Jz => {
            let target = bus.load(operand_addr)?;
            if regs.a == 0 {
                next_pc = target;
            }
        }
        Op::Jnz => {
            let target = bus.load(operand_addr)?;
            if regs.a != 0 {
                next_pc = target;
            }
        }
        Op::Swap { reg } => regs.swap_a(reg),
        Op::Halt => {
            // PC stays on the HCF byte.
            next_pc = pc;
            halted = true;
        }
    }

    regs.pc = next_pc;
    Ok(Executed {
        opcode,
        cycles: meta.cycles,
        halted,
    })
}

fn effective_addr<B: Bus + ?Sized>(
    mode: AddrMode,
    regs: &Registers,
    bus: &mut B,
    operand_addr: u8,
) -> Result<u8, Fault> {
    match mode {
        AddrMode::Direct => bus.load(operand_addr),
        AddrMode::IndirectA => Ok(regs.a),
    }
}

/// The machine's address space for the duration of one step.
pub struct MachineBus<'a, O: OutputSink + ?Sized> {
    variant: Variant,
    memory: &'a mut MemoryImage,
    engine: Option<&'a mut BlockTransferEngine>,
    cycle: u64,
    out: &'a mut O,
}

impl<'a, O: OutputSink + ?Sized> MachineBus<'a, O> {
    pub fn new(
        variant: Variant,
        memory: &'a mut MemoryImage,
        engine: Option<&'a mut BlockTransferEngine>,
        cycle: u64,
        out: &'a mut O,
    ) -> Self {
        Self {
            variant,
            memory,
            engine,
            cycle,
            out,
        }
    }

    fn engine_write(
        &mut self,
        addr: u8,
        register: crate::EngineRegister,
        value: u8,
    ) -> Result<(), Fault> {
        let engine = self.engine.as_deref_mut().ok_or(Fault::IllegalAddress {
            addr,
            access: Access::Write,
        })?;
        let Some(transfer) = engine.write(register, value, self.cycle)? else {
            return Ok(());
        };
        for (offset, byte) in transfer.data.iter().enumerate() {
            self.store(transfer.dst.wrapping_add(offset as u8), *byte)?;
        }
        if let Some(engine) = self.engine.as_deref_mut() {
            engine.finish_transfer();
        }
        Ok(())
    }
}

impl<'a, O: OutputSink + ?Sized> Bus for MachineBus<'a, O> {
    fn load(&mut self, addr: u8) -> Result<u8, Fault> {
        match region(self.variant, addr) {
            Region::Rom(offset) => Ok(self.memory.rom_byte(offset)),
            Region::Ram(offset) => Ok(self.memory.ram_byte(offset)),
            Region::Output | Region::Engine(_) | Region::Unmapped => Err(Fault::IllegalAddress {
                addr,
                access: Access::Read,
            }),
        }
    }

    fn store(&mut self, addr: u8, value: u8) -> Result<(), Fault> {
        match region(self.variant, addr) {
            Region::Rom(_) => Err(Fault::ProtectedWrite { addr }),
            Region::Ram(offset) => {
                self.memory.set_ram_byte(offset, value);
                Ok(())
            }
            Region::Output => {
                self.out.emit(value);
                Ok(())
            }
            Region::Engine(register) => self.engine_write(addr, register, value),
            Region::Unmapped => Err(Fault::IllegalAddress {
                addr,
                access: Access::Write,
            }),
        }
    }
}

impl Machine {
    /// Execute one instruction.
    ///
    /// A faulting step leaves the registers, PC and cycle counter untouched and
    /// latches the fault: every later call returns it again without executing.
    /// Stepping a halted machine executes nothing.
    pub fn step<O: OutputSink + ?Sized>(&mut self, out: &mut O) -> Result<StepOutcome, Fault> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        if self.halted {
            return Ok(StepOutcome::Halted);
        }

        let start_cycle = self.clock.now();
        let mut regs = self.regs;
        let mut bus = MachineBus::new(
            self.variant,
            &mut self.memory,
            self.engine.as_mut(),
            start_cycle,
            out,
        );
        match execute(&mut regs, &mut bus) {
            Ok(executed) => {
                trace!(
                    pc = self.regs.pc,
                    opcode = executed.opcode,
                    cycle = start_cycle,
                    "step"
                );
                self.regs = regs;
                self.clock.advance(executed.cycles);
                if executed.halted {
                    self.halted = true;
                    Ok(StepOutcome::Halted)
                } else {
                    Ok(StepOutcome::Continue)
                }
            }
            Err(fault) => {
                debug!(pc = self.regs.pc, cycle = start_cycle, %fault, "step faulted");
                self.fault = Some(fault);
                Err(fault)
            }
        }
    }
}
