//! FOOL compiler.
//!
//! Three passes over one [`CompilationUnit`]:
//!
//! - **Symbol table** ([`SymbolTablePass`]): nesting levels, frame offsets,
//!   dispatch offsets, and the entry behind every use of a name
//! - **Type check** ([`TypeCheckPass`]): expression types under the
//!   [`is_subtype`] relation
//! - **Code generation** ([`CodegenPass`]): stack-machine assembly
//!
//! ## Modules
//!
//! - [`emit`]: assembly emitter with out-of-line function bodies
//! - [`passes`]: the three passes
//! - [`scope`]: lexical scopes used by the symbol table
//! - [`unit`]: the tree plus the side tables filled in by the passes
//!
//! # Example
//!
//! ```
//! use fool_compiler::Compiler;
//! use fool_parser::Parser;
//!
//! let tree = Parser::parse("let var x:int = 5; in print(x);").unwrap();
//! let compiled = Compiler::default().compile(tree).unwrap();
//! assert!(compiled.code.to_string().ends_with("print\nhalt"));
//! ```

mod dump;
pub mod emit;
mod options;
pub mod passes;
pub mod scope;
mod subtyping;
pub mod unit;

pub use dump::dump;
pub use options::CompileOptions;
pub use passes::{
    CodegenOutput, CodegenPass, SymbolTableOutput, SymbolTablePass, TypeCheckOutput,
    TypeCheckPass,
};
pub use subtyping::is_subtype;
pub use unit::{CompilationUnit, EntryId, SideTables, Stage, SymbolEntry, Use};

pub use fool_core::{CompilationError, CompilationErrors};

use fool_core::AsmProgram;
use fool_parser::{Tree, Type};

/// A successfully compiled program.
#[derive(Debug)]
pub struct CompiledProgram {
    /// The generated assembly.
    pub code: AsmProgram,
    /// Type of the program's main expression.
    pub program_type: Type,
    /// The fully enriched unit, kept for inspection.
    pub unit: CompilationUnit,
}

/// Runs the passes in order. Name and type errors are reported together;
/// code is generated only when both passes are clean.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a parsed tree.
    pub fn compile(&self, tree: Tree) -> Result<CompiledProgram, CompilationErrors> {
        self.compile_unit(CompilationUnit::new(tree))
    }

    /// Compile a unit that no pass has touched yet.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_unit(
        &self,
        mut unit: CompilationUnit,
    ) -> Result<CompiledProgram, CompilationErrors> {
        let resolved = SymbolTablePass::new(&mut unit).run();
        let checked = TypeCheckPass::new(&mut unit).run();

        let mut errors = resolved.errors;
        errors.extend(checked.errors);
        if !errors.is_empty() {
            return Err(CompilationErrors::new(errors));
        }
        let Some(program_type) = checked.program_type else {
            return Err(CompilationError::internal("type check produced no program type").into());
        };

        let generated = CodegenPass::new(&mut unit, self.options).run();
        if !generated.errors.is_empty() {
            return Err(CompilationErrors::new(generated.errors));
        }

        Ok(CompiledProgram {
            code: generated.program,
            program_type,
            unit,
        })
    }
}
