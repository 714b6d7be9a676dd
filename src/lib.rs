//! FOOL: a compiler and stack virtual machine for a small object-oriented
//! language.
//!
//! The pipeline runs source text through three crates:
//!
//! 1. [`fool_parser`]: lexer and parser producing the syntax [`Tree`]
//! 2. [`fool_compiler`]: symbol table, type checker and code generator
//!    producing an [`AsmProgram`]
//! 3. [`fool_vm`]: assembler and [`Machine`]
//!
//! The functions in this crate chain the stages and fold every failure into
//! [`FoolError`].
//!
//! # Example
//!
//! ```
//! let outcome = fool::run("let var x:int = 5; in print(x * 2);").unwrap();
//! assert_eq!(outcome.printed, vec![10]);
//! ```

use std::io::{self, Write};

pub use fool_compiler::{CompileOptions, CompiledProgram, Compiler};
pub use fool_core::{AsmProgram, FoolError, MEMSIZE, Word};
pub use fool_parser::{Parser, Tree, Type};
pub use fool_vm::{Machine, MachineConfig, Outcome, Program};

pub mod prelude {
    pub use fool_compiler::{
        CodegenPass, CompilationUnit, CompileOptions, CompiledProgram, Compiler, Stage,
        SymbolTablePass, TypeCheckPass, dump, is_subtype,
    };
    pub use fool_core::{
        AsmLine, AsmProgram, AssemblyError, CompilationError, CompilationErrors, FoolError,
        MEMSIZE, OpCode, Operand, ParseErrors, RuntimeError, Span, Word,
    };
    pub use fool_parser::{Parser, Tree, Type};
    pub use fool_vm::{Machine, MachineConfig, Outcome, Program, assemble, assemble_text};
}

/// Parse source text.
pub fn parse(source: &str) -> Result<Tree, FoolError> {
    Ok(Parser::parse(source)?)
}

/// Parse and compile source text to assembly.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompiledProgram, FoolError> {
    let tree = parse(source)?;
    Ok(Compiler::new(*options).compile(tree)?)
}

/// Compile and execute source text with the default machine, discarding
/// printed text. The printed values are in the [`Outcome`].
pub fn run(source: &str) -> Result<Outcome, FoolError> {
    run_with_output(source, MachineConfig::default(), &mut io::sink())
}

/// Compile and execute source text, writing printed values to `out`.
///
/// The program is compiled for `config.memory_size`, so the global frame
/// addressed by the generated code is the one the machine sets up.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run_with_output(
    source: &str,
    config: MachineConfig,
    out: &mut dyn Write,
) -> Result<Outcome, FoolError> {
    let options = CompileOptions::with_memory_size(config.memory_size);
    let compiled = compile(source, &options)?;
    execute(&compiled.code, config, out)
}

/// Assemble and execute a program.
pub fn execute(
    code: &AsmProgram,
    config: MachineConfig,
    out: &mut dyn Write,
) -> Result<Outcome, FoolError> {
    let program = fool_vm::assemble(code)?;
    Ok(fool_vm::execute(&program, config, out)?)
}

/// Assemble and execute assembly text, as written by `fool build`.
pub fn execute_text(
    text: &str,
    config: MachineConfig,
    out: &mut dyn Write,
) -> Result<Outcome, FoolError> {
    execute(&AsmProgram::parse(text)?, config, out)
}
