//! Stack virtual machine for FOOL assembly.
//!
//! Execution has two steps: [`assemble`] turns an [`AsmProgram`] (or its
//! text form) into flat code memory with every label resolved, and a
//! [`Machine`] runs that code from address 0 until `halt`.
//!
//! ```
//! use fool_vm::{Machine, MachineConfig, assemble_text};
//!
//! let program = assemble_text("push 2\npush 3\nmult\nprint\nhalt").unwrap();
//! let outcome = Machine::new(&program, MachineConfig::default()).run().unwrap();
//! assert_eq!(outcome.printed, vec![6]);
//! ```
//!
//! [`AsmProgram`]: fool_core::AsmProgram

mod assembler;
mod config;
mod machine;
mod memory;

pub use assembler::{Program, assemble, assemble_text};
pub use config::MachineConfig;
pub use machine::{Machine, MachineState, Outcome, Registers};

use std::io::Write;

use fool_core::RuntimeError;

/// Run `program` to `halt` on a fresh machine.
pub fn execute(
    program: &Program,
    config: MachineConfig,
    out: &mut dyn Write,
) -> Result<Outcome, RuntimeError> {
    Machine::new(program, config).run_with_output(out)
}
