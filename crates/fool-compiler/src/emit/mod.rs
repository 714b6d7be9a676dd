//! Assembly emitter for the FOOL code generator.
//!
//! The [`AsmEmitter`] collects [`AsmLine`]s for the main program and for the
//! out-of-line function bodies. Function bodies are emitted while their
//! declaration is being lowered, so the emitter keeps a stack of open
//! bodies: [`begin_function`](AsmEmitter::begin_function) redirects output
//! to a fresh buffer and [`end_function`](AsmEmitter::end_function) moves
//! the finished body to the hoisted section. A body nested in another
//! function is therefore completed, and placed, before its parent.
//!
//! # Example
//!
//! ```
//! use fool_compiler::emit::AsmEmitter;
//! use fool_core::OpCode;
//!
//! let mut emitter = AsmEmitter::new();
//! let entry = emitter.fresh_function_label();
//! emitter.push_label(&entry);
//! emitter.begin_function(&entry);
//! emitter.emit(OpCode::Halt);
//! emitter.end_function();
//! emitter.emit(OpCode::Halt);
//!
//! let program = emitter.finish();
//! assert_eq!(program.to_string(), "push function0\nhalt\nfunction0:\nhalt");
//! ```

mod labels;

use fool_core::{AsmLine, AsmProgram, OpCode, Word};

pub use labels::LabelAllocator;

/// Emits assembly lines.
#[derive(Debug, Default)]
pub struct AsmEmitter {
    /// Code of the main program.
    main: Vec<AsmLine>,
    /// Function bodies under construction, innermost last.
    open: Vec<Vec<AsmLine>>,
    /// Finished function bodies, in completion order.
    functions: Vec<AsmLine>,
    labels: LabelAllocator,
}

impl AsmEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Vec<AsmLine> {
        match self.open.last_mut() {
            Some(body) => body,
            None => &mut self.main,
        }
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit an instruction without operand.
    pub fn emit(&mut self, op: OpCode) {
        self.current().push(AsmLine::op(op));
    }

    /// Emit the same instruction `count` times.
    pub fn emit_n(&mut self, op: OpCode, count: usize) {
        for _ in 0..count {
            self.emit(op);
        }
    }

    /// Emit `push value`.
    pub fn push_int(&mut self, value: Word) {
        self.current().push(AsmLine::push(value));
    }

    /// Emit `push label`: the address of a label as a value.
    pub fn push_label(&mut self, label: &str) {
        self.current().push(AsmLine::with_label(OpCode::Push, label));
    }

    /// Emit a branch (`b`, `beq` or `bleq`) to `label`.
    pub fn jump(&mut self, op: OpCode, label: &str) {
        debug_assert!(matches!(
            op,
            OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        ));
        self.current().push(AsmLine::with_label(op, label));
    }

    /// Place `label` at the current position.
    pub fn place(&mut self, label: &str) {
        self.current().push(AsmLine::Label(label.to_string()));
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    pub fn fresh_label(&mut self) -> String {
        self.labels.fresh_label()
    }

    pub fn fresh_function_label(&mut self) -> String {
        self.labels.fresh_function_label()
    }

    // ==========================================================================
    // Out-of-line bodies
    // ==========================================================================

    /// Start the body of a function entered at `label`.
    pub fn begin_function(&mut self, label: &str) {
        self.open.push(vec![AsmLine::Label(label.to_string())]);
    }

    /// Finish the innermost open body and hoist it.
    ///
    /// Returns `false` if no body was open.
    pub fn end_function(&mut self) -> bool {
        match self.open.pop() {
            Some(body) => {
                self.functions.extend(body);
                true
            }
            None => false,
        }
    }

    /// Number of bodies currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// The main program followed by every hoisted body.
    ///
    /// Bodies still open are closed in innermost-first order.
    pub fn finish(mut self) -> AsmProgram {
        while self.end_function() {}
        let mut lines = self.main;
        lines.extend(self.functions);
        AsmProgram::from_lines(lines)
    }
}
