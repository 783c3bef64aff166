use coolcpu_isa::Reg;
use serde::{Deserialize, Serialize};

/// Architectural register file. All registers are 8-bit and wrap on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub pc: u8,
}

impl Registers {
    pub fn get(&self, reg: Reg) -> u8 {
        match reg {
            Reg::A => self.a,
            Reg::B => self.b,
            Reg::C => self.c,
        }
    }

    pub fn set(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::A => self.a = value,
            Reg::B => self.b = value,
            Reg::C => self.c = value,
        }
    }

    /// Exchange A with `other`. Swapping A with itself is a no-op.
    pub fn swap_a(&mut self, other: Reg) {
        let a = self.a;
        self.a = self.get(other);
        self.set(other, a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_values() {
        let mut regs = Registers {
            a: 1,
            b: 2,
            c: 3,
            pc: 0,
        };
        regs.swap_a(Reg::C);
        assert_eq!((regs.a, regs.b, regs.c), (3, 2, 1));
        regs.swap_a(Reg::B);
        assert_eq!((regs.a, regs.b, regs.c), (2, 3, 1));
        regs.swap_a(Reg::A);
        assert_eq!(regs.a, 2);
    }
}
