//! Compiler passes, in the order they run.
//!
//! - [`symbol_table`]: Pass 1 - bind declarations and uses to entries
//! - [`type_check`]: Pass 2 - compute and validate expression types
//! - [`codegen`]: Pass 3 - lower the tree to stack-machine assembly
//!
//! Each pass takes the [`CompilationUnit`](crate::CompilationUnit) at the
//! stage the previous pass leaves it in and refuses to run otherwise.

pub mod codegen;
pub mod symbol_table;
pub mod type_check;

pub use codegen::{CodegenOutput, CodegenPass};
pub use symbol_table::{SymbolTableOutput, SymbolTablePass};
pub use type_check::{TypeCheckOutput, TypeCheckPass};
