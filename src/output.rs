use std::cell::RefCell;
use std::fmt::Display;

use colored::Colorize;

use crate::runtime::{Machine, Port, Trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    /// Program output, on stdout.
    Normal,
    /// Traces, register dumps and status messages, on stderr.
    Diagnostic,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    /// Minimal output drops colors and status messages.
    pub fn set_minimal(new_value: bool) -> bool {
        if new_value {
            colored::control::set_override(false);
        } else {
            colored::control::unset_override();
        }
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => print!("{}", string),
            Self::Diagnostic => eprint!("{}", string),
        }
    }

    pub fn print_line(&self, string: impl Display) {
        self.print_str(&format!("{string}\n"));
    }

    pub fn print_decimal(&self, value: u8) {
        self.print_line(value);
    }

    pub fn print_trace(&self, trace: &Trace) {
        if Self::is_minimal() {
            self.print_line(trace);
        } else {
            self.print_line(trace.to_string().dimmed());
        }
    }

    pub fn print_registers(&self, machine: &Machine) {
        let reg = machine.registers();
        if Self::is_minimal() {
            for (i, val) in reg.iter().enumerate() {
                self.print_line(format_args!("R{i} {val}"));
            }
            self.print_line(format_args!("PC {}", machine.pc()));
            self.print_line(format_args!("FL {:03b}", machine.flags().bits()));
            return;
        }

        self.print_line("┌──────────────────────────┐".dimmed());
        self.print_line(format!("│      {:<7}{:<6}{:<7}│", "hex", "uint", "bin").dimmed());
        for (i, val) in reg.iter().enumerate() {
            let name = if i == 7 { "SP" } else { "" };
            self.print_line(format_args!(
                "{} {}  0x{:02x}  {:>3}   {:08b} {}",
                "│".dimmed(),
                format!("R{i}").bold(),
                val,
                val,
                val,
                format!("{name:>2}│").dimmed(),
            ));
        }
        self.print_line(format_args!(
            "{} {}  0x{:02x}        {} {:03b}    {}",
            "│".dimmed(),
            "PC".bold(),
            machine.pc(),
            "FL".bold(),
            machine.flags().bits(),
            "│".dimmed(),
        ));
        self.print_line("└──────────────────────────┘".dimmed());
    }
}

/// Port for the command line: numbers to stdout, traces to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct Console;

impl Port for Console {
    fn print_number(&mut self, val: u8) {
        Output::Normal.print_decimal(val);
    }

    fn trace(&mut self, trace: &Trace) {
        Output::Diagnostic.print_trace(trace);
    }
}
