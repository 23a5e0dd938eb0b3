use std::cmp::Ordering;

use crate::error::FaultKind;

/// Initial stack pointer. The stack grows down from here.
pub const STACK_TOP: u8 = 0xF4;

/// Index of the register aliased as the stack pointer.
const SP: u8 = 7;

/// The eight general purpose registers.
///
/// R7 doubles as the stack pointer; prefer [`RegisterFile::stack_pointer`] over indexing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    reg: [u8; 8],
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            reg: [0, 0, 0, 0, 0, 0, 0, STACK_TOP],
        }
    }

    pub fn get(&self, idx: u8) -> Result<u8, FaultKind> {
        self.reg
            .get(idx as usize)
            .copied()
            .ok_or(FaultKind::RegisterOutOfRange(idx))
    }

    pub fn set(&mut self, idx: u8, val: u8) -> Result<(), FaultKind> {
        let reg = self
            .reg
            .get_mut(idx as usize)
            .ok_or(FaultKind::RegisterOutOfRange(idx))?;
        *reg = val;
        Ok(())
    }

    pub fn stack_pointer(&self) -> u8 {
        self.reg[SP as usize]
    }

    pub fn set_stack_pointer(&mut self, val: u8) {
        self.reg[SP as usize] = val;
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.reg.iter().copied()
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of the last `CMP`, laid out as `00000LGE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const EQUAL: u8 = 0b001;
    pub const GREATER: u8 = 0b010;
    pub const LESS: u8 = 0b100;

    /// Replace all flags with the outcome of comparing `a` to `b`.
    pub fn compare(&mut self, a: u8, b: u8) {
        self.0 = match a.cmp(&b) {
            Ordering::Less => Self::LESS,
            Ordering::Equal => Self::EQUAL,
            Ordering::Greater => Self::GREATER,
        }
    }

    pub fn equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub fn greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn less(self) -> bool {
        self.0 & Self::LESS != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_pointer_is_r7() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.stack_pointer(), STACK_TOP);
        assert_eq!(regs.get(7), Ok(STACK_TOP));

        regs.set_stack_pointer(0x10);
        assert_eq!(regs.get(7), Ok(0x10));
        regs.set(7, 0x20).unwrap();
        assert_eq!(regs.stack_pointer(), 0x20);
    }

    #[test]
    fn register_bounds() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.get(8), Err(FaultKind::RegisterOutOfRange(8)));
        assert_eq!(regs.set(255, 1), Err(FaultKind::RegisterOutOfRange(255)));
        assert_eq!(regs, RegisterFile::new());
    }

    #[test]
    fn compare_sets_one_flag() {
        let mut flags = Flags::default();
        for (a, b, bits) in [
            (1, 2, Flags::LESS),
            (2, 1, Flags::GREATER),
            (7, 7, Flags::EQUAL),
            (0, 255, Flags::LESS),
        ] {
            flags.compare(a, b);
            assert_eq!(flags.bits(), bits, "compare({a}, {b})");
            assert_eq!(bits.count_ones(), 1);
        }
    }
}
