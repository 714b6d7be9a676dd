use fool_core::{MEMSIZE, Word};

/// Machine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Words shared by the stack and the heap. The global frame pointer
    /// starts here, so it must match the size the program was compiled for.
    pub memory_size: Word,
    /// Stop with an error after this many instructions.
    pub step_limit: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: MEMSIZE,
            step_limit: None,
        }
    }
}

impl MachineConfig {
    pub fn with_memory_size(mut self, memory_size: Word) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }
}
