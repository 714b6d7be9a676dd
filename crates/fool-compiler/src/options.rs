//! Compiler configuration.

use fool_core::{MEMSIZE, Word};

/// Options that affect generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Size of the target machine's address space.
    ///
    /// The global frame pointer starts at this address; `new` reads the
    /// dispatch pointer of a class from the global frame relative to it, so
    /// it must match the machine the code runs on.
    pub memory_size: Word,
}

impl CompileOptions {
    pub fn with_memory_size(memory_size: Word) -> Self {
        Self { memory_size }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            memory_size: MEMSIZE,
        }
    }
}
