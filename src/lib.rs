// Machine
mod alu;
mod memory;
mod opcode;
mod registers;
mod runtime;
pub use memory::{Memory, MEMORY_SIZE};
pub use opcode::{AluOp, Opcode};
pub use registers::{Flags, RegisterFile, STACK_TOP};
pub use runtime::{HaltHandle, Machine, Port, RunState, Trace};

// Loading
mod loader;
pub use loader::Program;

mod output;
pub use output::{Console, Output};

pub mod error;
pub use error::{Fault, FaultKind, LoadError};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
