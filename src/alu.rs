use crate::error::FaultKind;
use crate::opcode::AluOp;
use crate::registers::{Flags, RegisterFile};

/// Perform `op` on registers `a` and `b`.
///
/// The result is written to `a`, except for [`AluOp::Cmp`] which only updates `flags`.
/// On error nothing is written.
pub fn apply(
    op: AluOp,
    reg: &mut RegisterFile,
    flags: &mut Flags,
    a: u8,
    b: u8,
) -> Result<(), FaultKind> {
    let val_a = reg.get(a)?;
    let val_b = reg.get(b)?;
    if op == AluOp::Cmp {
        flags.compare(val_a, val_b);
        return Ok(());
    }
    let res = compute(op, val_a, val_b)?;
    reg.set(a, res)
}

fn compute(op: AluOp, a: u8, b: u8) -> Result<u8, FaultKind> {
    // Widen so every result is masked the same way
    let (a, b) = (a as u32, b as u32);
    let res = match op {
        AluOp::Add => a + b,
        AluOp::Mul => a * b,
        AluOp::Or => a | b,
        AluOp::Mod => a.checked_rem(b).ok_or(FaultKind::DivisionByZero)?,
        AluOp::Shl => a.checked_shl(b).unwrap_or(0),
        AluOp::Shr => a.checked_shr(b).unwrap_or(0),
        AluOp::Cmp => unreachable!("compare does not produce a value"),
    };
    Ok((res & 0xFF) as u8)
}
