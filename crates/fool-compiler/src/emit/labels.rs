//! Fresh label names.
//!
//! Branch labels and function entry labels are numbered independently, so
//! `label0` and `function0` can coexist. Both counters belong to one code
//! generation run; a new run starts again from zero.

/// Hands out unique label names for one program.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next_label: u32,
    next_function: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label for a branch target: `label0`, `label1`, ...
    pub fn fresh_label(&mut self) -> String {
        let name = format!("label{}", self.next_label);
        self.next_label += 1;
        name
    }

    /// A label for a function or method entry: `function0`, `function1`, ...
    pub fn fresh_function_label(&mut self) -> String {
        let name = format!("function{}", self.next_function);
        self.next_function += 1;
        name
    }
}
