use std::fmt;

use crate::error::FaultKind;

/// Arithmetic and logic operations, dispatched to [`crate::alu::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Mul,
    Mod,
    Cmp,
    Or,
    Shl,
    Shr,
}

/// A decoded opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Hlt,
    Ldi,
    Prn,
    Push,
    Pop,
    Call,
    Ret,
    Jmp,
    Jeq,
    Jne,
    Alu(AluOp),
    /// Not an ALU opcode and not known. Skipped over.
    Unknown(u8),
}

impl Opcode {
    pub const HLT: u8 = 0b0000_0001;
    pub const RET: u8 = 0b0001_0001;
    pub const PUSH: u8 = 0b0100_0101;
    pub const POP: u8 = 0b0100_0110;
    pub const PRN: u8 = 0b0100_0111;
    pub const CALL: u8 = 0b0101_0000;
    pub const JMP: u8 = 0b0101_0100;
    pub const JEQ: u8 = 0b0101_0101;
    pub const JNE: u8 = 0b0101_0110;
    pub const LDI: u8 = 0b1000_0010;
    pub const ADD: u8 = 0b1010_0000;
    pub const MUL: u8 = 0b1010_0010;
    pub const MOD: u8 = 0b1010_0100;
    pub const CMP: u8 = 0b1010_0111;
    pub const OR: u8 = 0b1010_1010;
    pub const SHL: u8 = 0b1010_1100;
    pub const SHR: u8 = 0b1010_1101;

    /// Fails only for bytes marked as ALU operations that name no [`AluOp`].
    pub fn decode(byte: u8) -> Result<Opcode, FaultKind> {
        let opcode = match byte {
            Self::HLT => Opcode::Hlt,
            Self::RET => Opcode::Ret,
            Self::PUSH => Opcode::Push,
            Self::POP => Opcode::Pop,
            Self::PRN => Opcode::Prn,
            Self::CALL => Opcode::Call,
            Self::JMP => Opcode::Jmp,
            Self::JEQ => Opcode::Jeq,
            Self::JNE => Opcode::Jne,
            Self::LDI => Opcode::Ldi,
            Self::ADD => Opcode::Alu(AluOp::Add),
            Self::MUL => Opcode::Alu(AluOp::Mul),
            Self::MOD => Opcode::Alu(AluOp::Mod),
            Self::CMP => Opcode::Alu(AluOp::Cmp),
            Self::OR => Opcode::Alu(AluOp::Or),
            Self::SHL => Opcode::Alu(AluOp::Shl),
            Self::SHR => Opcode::Alu(AluOp::Shr),
            _ if is_alu(byte) => return Err(FaultKind::UnsupportedOperation(byte)),
            _ => Opcode::Unknown(byte),
        };
        Ok(opcode)
    }

    pub fn encode(self) -> u8 {
        match self {
            Opcode::Hlt => Self::HLT,
            Opcode::Ldi => Self::LDI,
            Opcode::Prn => Self::PRN,
            Opcode::Push => Self::PUSH,
            Opcode::Pop => Self::POP,
            Opcode::Call => Self::CALL,
            Opcode::Ret => Self::RET,
            Opcode::Jmp => Self::JMP,
            Opcode::Jeq => Self::JEQ,
            Opcode::Jne => Self::JNE,
            Opcode::Alu(op) => match op {
                AluOp::Add => Self::ADD,
                AluOp::Mul => Self::MUL,
                AluOp::Mod => Self::MOD,
                AluOp::Cmp => Self::CMP,
                AluOp::Or => Self::OR,
                AluOp::Shl => Self::SHL,
                AluOp::Shr => Self::SHR,
            },
            Opcode::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Alu(AluOp::Add) => "ADD",
            Opcode::Alu(AluOp::Mul) => "MUL",
            Opcode::Alu(AluOp::Mod) => "MOD",
            Opcode::Alu(AluOp::Cmp) => "CMP",
            Opcode::Alu(AluOp::Or) => "OR",
            Opcode::Alu(AluOp::Shl) => "SHL",
            Opcode::Alu(AluOp::Shr) => "SHR",
            Opcode::Unknown(byte) => return write!(f, "??? ({byte:#04x})"),
        };
        f.write_str(name)
    }
}

// Fields packed into every opcode byte: `AABCDDDD`
// AA: operand count, B: ALU operation, C: sets PC, DDDD: instruction identifier

#[inline]
pub const fn operand_count(byte: u8) -> usize {
    ((byte >> 6) & 0b11) as usize
}

#[inline]
pub const fn is_alu(byte: u8) -> bool {
    (byte >> 5) & 1 != 0
}

#[inline]
pub const fn sets_pc(byte: u8) -> bool {
    (byte >> 4) & 1 != 0
}

/// Bytes taken by the opcode and its operands.
#[inline]
pub const fn instruction_size(byte: u8) -> usize {
    operand_count(byte) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[Opcode] = &[
        Opcode::Hlt,
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Jmp,
        Opcode::Jeq,
        Opcode::Jne,
        Opcode::Alu(AluOp::Add),
        Opcode::Alu(AluOp::Mul),
        Opcode::Alu(AluOp::Mod),
        Opcode::Alu(AluOp::Cmp),
        Opcode::Alu(AluOp::Or),
        Opcode::Alu(AluOp::Shl),
        Opcode::Alu(AluOp::Shr),
    ];

    #[test]
    fn decode_known() {
        for &opcode in KNOWN {
            assert_eq!(Opcode::decode(opcode.encode()), Ok(opcode), "{opcode}");
        }
    }

    #[test]
    fn encoded_fields_match_semantics() {
        #[rustfmt::skip]
        let cases = [
            // (opcode, operands, alu, sets pc)
            (Opcode::Hlt,  0, false, false),
            (Opcode::Ret,  0, false, true),
            (Opcode::Push, 1, false, false),
            (Opcode::Pop,  1, false, false),
            (Opcode::Prn,  1, false, false),
            (Opcode::Call, 1, false, true),
            (Opcode::Jmp,  1, false, true),
            (Opcode::Jeq,  1, false, true),
            (Opcode::Jne,  1, false, true),
            (Opcode::Ldi,  2, false, false),
        ];
        for (opcode, operands, alu, pc) in cases {
            let byte = opcode.encode();
            assert_eq!(operand_count(byte), operands, "{opcode}");
            assert_eq!(is_alu(byte), alu, "{opcode}");
            assert_eq!(sets_pc(byte), pc, "{opcode}");
        }
        for &opcode in KNOWN {
            if let Opcode::Alu(_) = opcode {
                let byte = opcode.encode();
                assert_eq!(operand_count(byte), 2, "{opcode}");
                assert!(is_alu(byte), "{opcode}");
                assert!(!sets_pc(byte), "{opcode}");
            }
        }
    }

    #[test]
    fn decode_unknown() {
        assert_eq!(Opcode::decode(0x00), Ok(Opcode::Unknown(0x00)));
        assert_eq!(Opcode::decode(0x57), Ok(Opcode::Unknown(0x57)));
        // SUB is a valid LS8 ALU encoding but not implemented here
        assert_eq!(
            Opcode::decode(0xA1),
            Err(FaultKind::UnsupportedOperation(0xA1))
        );
        assert_eq!(
            Opcode::decode(0x65),
            Err(FaultKind::UnsupportedOperation(0x65))
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(instruction_size(Opcode::HLT), 1);
        assert_eq!(instruction_size(Opcode::CALL), 2);
        assert_eq!(instruction_size(Opcode::LDI), 3);
        assert_eq!(instruction_size(0xFF), 4);
    }
}
