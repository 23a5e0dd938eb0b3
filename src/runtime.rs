use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::alu;
use crate::error::{Fault, FaultKind};
use crate::loader::Program;
use crate::memory::Memory;
use crate::opcode::{self, Opcode};
use crate::registers::{Flags, RegisterFile, STACK_TOP};

/// Where a running program sends its output.
pub trait Port {
    /// Called by `PRN`.
    fn print_number(&mut self, val: u8);

    /// Called once per cycle, before execution, when tracing is enabled.
    fn trace(&mut self, _trace: &Trace) {}
}

/// Collects printed values, mostly useful for tests.
impl Port for Vec<u8> {
    fn print_number(&mut self, val: u8) {
        self.push(val);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Running,
    Halted,
}

/// Lets the host stop a machine from outside the fetch loop.
///
/// The request is honoured before the next cycle starts; the current one is never interrupted.
#[derive(Clone, Debug, Default)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Complete state of one LS8 machine.
pub struct Machine {
    mem: Memory,
    reg: RegisterFile,
    flags: Flags,
    pc: usize,
    /// Instruction register; opcode of the current or most recent instruction.
    ir: u8,
    state: RunState,
    halt: HaltHandle,
    tracing: bool,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            mem: Memory::new(),
            reg: RegisterFile::new(),
            flags: Flags::default(),
            pc: 0,
            ir: 0,
            state: RunState::Running,
            halt: HaltHandle::default(),
            tracing: false,
        }
    }

    pub fn from_program(program: &Program) -> Self {
        let mut machine = Self::new();
        machine.load(program);
        machine
    }

    /// Write `program` to the start of memory.
    pub fn load(&mut self, program: &Program) {
        // `Program` never exceeds memory size
        self.mem
            .write_all(program.bytes())
            .unwrap_or_else(|_| unreachable!("program larger than memory"));
    }

    pub fn set_trace(&mut self, tracing: bool) {
        self.tracing = tracing;
    }

    pub fn halt_handle(&self) -> HaltHandle {
        self.halt.clone()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    /// Snapshot of the current cycle, as shown by the trace output.
    pub fn snapshot(&self) -> Trace {
        let byte = |offs| self.mem.peek(self.pc + offs);
        Trace {
            pc: self.pc,
            instr: [byte(0), byte(1), byte(2)],
            reg: self.reg,
        }
    }

    /// Run until `HLT`, a fault, or a halt request.
    ///
    /// Returns the number of cycles executed.
    pub fn run(&mut self, port: &mut impl Port) -> Result<u64, Fault> {
        let mut cycles = 0;
        while self.state == RunState::Running {
            if self.halt.is_requested() {
                self.state = RunState::Halted;
                break;
            }
            self.step(port)?;
            cycles += 1;
        }
        Ok(cycles)
    }

    /// Execute a single instruction. Any fault halts the machine.
    pub fn step(&mut self, port: &mut impl Port) -> Result<(), Fault> {
        if self.state == RunState::Halted {
            return Ok(());
        }
        let pc = self.pc;
        self.cycle(port).map_err(|kind| {
            self.state = RunState::Halted;
            Fault {
                kind,
                pc,
                opcode: self.mem.peek(pc).map(|_| self.ir),
            }
        })
    }

    fn cycle(&mut self, port: &mut impl Port) -> Result<(), FaultKind> {
        self.ir = self.mem.read(self.pc)?;
        let instr = self.ir;
        if self.tracing {
            port.trace(&self.snapshot());
        }

        let mut operands = [0u8; 2];
        for (i, operand) in operands
            .iter_mut()
            .enumerate()
            .take(opcode::operand_count(instr))
        {
            *operand = self.mem.read(self.pc + 1 + i)?;
        }
        let [a, b] = operands;

        match Opcode::decode(instr)? {
            Opcode::Hlt => self.state = RunState::Halted,
            Opcode::Ldi => self.reg.set(a, b)?,
            Opcode::Prn => port.print_number(self.reg.get(a)?),
            Opcode::Push => self.push_reg(a)?,
            Opcode::Pop => self.pop_reg(a)?,
            Opcode::Alu(op) => alu::apply(op, &mut self.reg, &mut self.flags, a, b)?,
            Opcode::Call => {
                let target = self.reg.get(a)?;
                let ret = self.pc + opcode::instruction_size(instr);
                let ret = u8::try_from(ret).map_err(|_| FaultKind::AddressOutOfRange(ret))?;
                self.push_val(ret)?;
                self.pc = target as usize;
            }
            Opcode::Ret => self.pc = self.pop_val()? as usize,
            Opcode::Jmp => self.pc = self.reg.get(a)? as usize,
            Opcode::Jeq => self.branch_if(self.flags.equal(), a)?,
            Opcode::Jne => self.branch_if(!self.flags.equal(), a)?,
            Opcode::Unknown(_) if opcode::sets_pc(instr) => {
                self.pc += opcode::instruction_size(instr);
            }
            // Skipped by the increment below
            Opcode::Unknown(_) => (),
        }

        if !opcode::sets_pc(instr) {
            self.pc += opcode::instruction_size(instr);
        }
        Ok(())
    }

    fn branch_if(&mut self, cond: bool, a: u8) -> Result<(), FaultKind> {
        if cond {
            self.pc = self.reg.get(a)? as usize;
        } else {
            self.pc += opcode::instruction_size(self.ir);
        }
        Ok(())
    }

    fn push_val(&mut self, val: u8) -> Result<(), FaultKind> {
        let sp = self
            .reg
            .stack_pointer()
            .checked_sub(1)
            .ok_or(FaultKind::StackOverflow)?;
        self.mem.write(sp as usize, val)?;
        self.reg.set_stack_pointer(sp);
        Ok(())
    }

    /// `PUSH`: the register is read after SP moves, so `PUSH R7` stores the new SP.
    fn push_reg(&mut self, a: u8) -> Result<(), FaultKind> {
        self.reg.get(a)?;
        let sp = self
            .reg
            .stack_pointer()
            .checked_sub(1)
            .ok_or(FaultKind::StackOverflow)?;
        self.reg.set_stack_pointer(sp);
        let val = self.reg.get(a)?;
        self.mem.write(sp as usize, val)
    }

    /// `POP`: the register is written before SP moves, so `POP R7` ends one above the popped value.
    fn pop_reg(&mut self, a: u8) -> Result<(), FaultKind> {
        let sp = self.reg.stack_pointer();
        if sp >= STACK_TOP {
            return Err(FaultKind::StackUnderflow);
        }
        self.reg.get(a)?;
        let val = self.mem.read(sp as usize)?;
        self.reg.set(a, val)?;
        let sp = self.reg.stack_pointer();
        self.reg.set_stack_pointer(sp.wrapping_add(1));
        Ok(())
    }

    fn pop_val(&mut self) -> Result<u8, FaultKind> {
        let sp = self.reg.stack_pointer();
        if sp >= STACK_TOP {
            return Err(FaultKind::StackUnderflow);
        }
        let val = self.mem.read(sp as usize)?;
        self.reg.set_stack_pointer(sp + 1);
        Ok(val)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of trace output: PC, the instruction bytes and all registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trace {
    pub pc: usize,
    /// Opcode and the two bytes after it, `None` past the end of memory.
    pub instr: [Option<u8>; 3],
    pub reg: RegisterFile,
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRACE: {:02X} |", self.pc)?;
        for byte in self.instr {
            match byte {
                Some(byte) => write!(f, " {byte:02X}")?,
                None => write!(f, " --")?,
            }
        }
        write!(f, " |")?;
        for reg in self.reg.iter() {
            write!(f, " {reg:02X}")?;
        }
        Ok(())
    }
}
