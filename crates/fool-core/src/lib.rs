//! Core types shared by the FOOL compiler and virtual machine.
//!
//! This crate has no knowledge of the syntax tree. It provides:
//! - [`Span`] source locations
//! - the error taxonomy of every phase ([`error`])
//! - the stack-machine instruction set and its text form ([`bytecode`])

pub mod bytecode;
pub mod error;
pub mod span;

pub use bytecode::{AsmLine, AsmProgram, MEMSIZE, OpCode, Operand, Word};
pub use error::{
    AssemblyError, CompilationError, CompilationErrors, FoolError, LexError, ParseError,
    ParseErrorKind, ParseErrors, RuntimeError,
};
pub use span::Span;
