use std::fmt;
use std::io;
use std::ops::Range;
use std::path::PathBuf;

use miette::{miette, LabeledSpan, Report, Severity};

/// Condition that stops the machine mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    AddressOutOfRange(usize),
    RegisterOutOfRange(u8),
    /// Opcode has the ALU bit set but names no known operation.
    UnsupportedOperation(u8),
    DivisionByZero,
    StackUnderflow,
    StackOverflow,
}

impl std::error::Error for FaultKind {}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfRange(addr) => write!(f, "address {addr:#04x} is out of range"),
            Self::RegisterOutOfRange(idx) => write!(f, "register R{idx} does not exist"),
            Self::UnsupportedOperation(op) => write!(f, "unsupported ALU operation {op:#04x}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::StackOverflow => write!(f, "stack overflow"),
        }
    }
}

/// A [`FaultKind`] together with where it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub pc: usize,
    /// `None` if the opcode itself could not be fetched.
    pub opcode: Option<u8>,
}

impl std::error::Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at PC {:#04x}", self.kind, self.pc)?;
        if let Some(opcode) = self.opcode {
            write!(f, " (opcode {opcode:#010b})")?;
        }
        Ok(())
    }
}

/// Program could not be turned into memory contents.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    /// Line whose first word is not exactly 8 binary digits.
    InvalidByte { line: usize, span: Range<usize> },
    TooLarge { len: usize },
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            Self::InvalidByte { line, .. } => {
                write!(f, "line {line}: expected 8 binary digits")
            }
            Self::TooLarge { len } => {
                write!(f, "program is {len} bytes but memory holds 256")
            }
        }
    }
}

impl LoadError {
    /// Build a diagnostic. With `src`, a bad byte is labeled in its line.
    pub fn into_report(self, src: Option<&str>) -> Report {
        let message = self.to_string();
        match self {
            Self::Io { .. } => miette!(
                severity = Severity::Error,
                code = "load::io",
                help = "check that the file exists and is readable",
                "{message}",
            ),
            Self::InvalidByte { span, .. } => {
                let report = miette!(
                    severity = Severity::Error,
                    code = "load::invalid_byte",
                    help = "each line should start with a byte like 10000010, comments start with #",
                    labels = vec![LabeledSpan::at(span, "not a binary byte")],
                    "{message}",
                );
                match src {
                    Some(src) => report.with_source_code(src.to_owned()),
                    None => report,
                }
            }
            Self::TooLarge { .. } => miette!(
                severity = Severity::Error,
                code = "load::too_large",
                help = "the stack starts at 0xF4, keep programs well below that",
                "{message}",
            ),
        }
    }
}

// Runtime errors

pub fn run_fault(fault: Fault) -> Report {
    let (code, help) = match fault.kind {
        FaultKind::AddressOutOfRange(_) => (
            "run::address_out_of_range",
            "the program ran off the end of memory or jumped past it",
        ),
        FaultKind::RegisterOutOfRange(_) => (
            "run::register_out_of_range",
            "register operands must be between 0 and 7",
        ),
        FaultKind::UnsupportedOperation(_) => (
            "run::unsupported_operation",
            "supported ALU operations are ADD, MUL, MOD, CMP, OR, SHL and SHR",
        ),
        FaultKind::DivisionByZero => (
            "run::division_by_zero",
            "the second register of MOD must not be zero",
        ),
        FaultKind::StackUnderflow => (
            "run::stack_underflow",
            "every POP and RET needs a matching PUSH or CALL",
        ),
        FaultKind::StackOverflow => (
            "run::stack_overflow",
            "the stack grew past address 0, check for runaway recursion",
        ),
    };
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        "Machine halted: {fault}",
    )
}
