use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, Result};

use ls8::{Console, Machine, Output, Program};

/// Emulator for the LS8, a tiny 8-bit virtual machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `.ls8` program and print its output to the terminal
    Run {
        /// `.ls8` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print machine state before every instruction
        #[arg(short, long)]
        trace: bool,
    },
    /// Check that a `.ls8` file loads, without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    ls8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                trace,
            } => run(&name, minimal, trace),
            Command::Check { name } => {
                set_minimal(false);
                file_message(Green, "Checking", &name);
                let program = load(&name)?;
                let summary = format!("{} bytes, no errors found!", program.len());
                message(Green, "Success", &summary);
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false, false)
    } else {
        bail!(
            help = "try `ls8 <FILE>`, or `ls8 --help` for all commands",
            "No program file provided"
        )
    }
}

#[derive(Clone, Copy)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    Output::Diagnostic.print_line(format_args!("{left:>12} {right}"));
}

fn set_minimal(minimal: bool) {
    Output::set_minimal(minimal || ls8::env::is_minimal());
}

fn run(name: &Path, minimal: bool, trace: bool) -> Result<()> {
    set_minimal(minimal);
    file_message(MsgColor::Green, "Loading", name);
    let program = load(name)?;

    let mut machine = Machine::from_program(&program);
    machine.set_trace(trace || ls8::env::is_trace_enabled());

    message(MsgColor::Green, "Running", &format!("{} bytes", program.len()));
    match machine.run(&mut Console) {
        Ok(cycles) => {
            message(MsgColor::Cyan, "Halted", &format!("after {cycles} instructions"));
            Ok(())
        }
        Err(fault) => {
            message(MsgColor::Red, "Faulted", &fault.kind.to_string());
            if !Output::is_minimal() {
                Output::Diagnostic.print_registers(&machine);
            }
            Err(ls8::error::run_fault(fault))
        }
    }
}

/// Read and parse a program file, reporting errors against its source
fn load(name: &Path) -> Result<Program> {
    let src = Program::read_source(name).map_err(|e| e.into_report(None))?;
    Program::parse(&src).map_err(|e| e.into_report(Some(&src)))
}
