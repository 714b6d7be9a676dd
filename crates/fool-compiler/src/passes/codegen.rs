//! Code Generation Pass - lower the checked tree to stack-machine assembly.
//!
//! The main program is emitted in place; every function and method body is
//! emitted out of line and appended after the final `halt`. A declaration
//! leaves one word on the stack: the value of a variable, the entry label of
//! a function, or the dispatch-table base of a class. Those words form the
//! locals area of the enclosing frame, which is why the symbol table numbers
//! declarations with consecutive offsets.
//!
//! ## Calling convention
//!
//! ```text
//! caller: lfp                       control link
//!         argN .. arg1              parameters, last first
//!         lfp lw*hops               access link (frame of the declaring scope)
//!         stm ltm ltm               keep a copy to locate the callee
//!         [lw] push off add lw      callee address ([lw] only for methods)
//!         js
//! callee: cfp lra  locals  body  stm  pop*locals  sra pop  pop*params
//!         sfp ltm lra js
//! ```

use fool_core::{AsmProgram, CompilationError, OpCode, Word};
use fool_parser::ast::{BinaryOp, FunctionDecl, Node, NodeId, Tree, Type};

use crate::emit::AsmEmitter;
use crate::options::CompileOptions;
use crate::unit::{CompilationUnit, SideTables, Stage, SymbolEntry};

/// Output of the code generation pass.
#[derive(Debug, Default)]
pub struct CodegenOutput {
    /// The generated program. Empty if `errors` is not.
    pub program: AsmProgram,
    pub errors: Vec<CompilationError>,
}

/// Pass 3: code generation.
pub struct CodegenPass<'a> {
    unit: &'a mut CompilationUnit,
    options: CompileOptions,
}

impl<'a> CodegenPass<'a> {
    pub const NAME: &'static str = "code generation";

    pub fn new(unit: &'a mut CompilationUnit, options: CompileOptions) -> Self {
        Self { unit, options }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> CodegenOutput {
        if let Err(err) = self.unit.require_stage(Self::NAME, Stage::Checked) {
            return CodegenOutput {
                program: AsmProgram::new(),
                errors: vec![err],
            };
        }

        let mut generator = Generator {
            tree: self.unit.tree(),
            tables: self.unit.tables(),
            options: self.options,
            emitter: AsmEmitter::new(),
        };
        let result = match self.unit.tree().root() {
            Some(root) => generator.program(root),
            None => Err(CompilationError::internal("tree has no root")),
        };
        let output = match result {
            Ok(()) => CodegenOutput {
                program: generator.emitter.finish(),
                errors: Vec::new(),
            },
            Err(err) => CodegenOutput {
                program: AsmProgram::new(),
                errors: vec![err],
            },
        };

        self.unit.advance(Stage::Generated);
        output
    }
}

// ============================================================================
// Generator
// ============================================================================

type GenResult = Result<(), CompilationError>;

struct Generator<'t> {
    tree: &'t Tree,
    tables: &'t SideTables,
    options: CompileOptions,
    emitter: AsmEmitter,
}

impl<'t> Generator<'t> {
    fn program(&mut self, root: NodeId) -> GenResult {
        match self.tree.node(root) {
            Node::Prog { body } => {
                self.expr(*body)?;
            }
            Node::LetInProg {
                classes,
                decs,
                body,
            } => {
                // Sentinel slot of the global frame.
                self.emitter.push_int(0);
                for &dec in classes.iter().chain(decs) {
                    self.declaration(dec)?;
                }
                self.expr(*body)?;
            }
            other => {
                return Err(CompilationError::internal(format!(
                    "{} is not a program",
                    other.kind_name()
                )));
            }
        }
        self.emitter.emit(OpCode::Halt);
        Ok(())
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn declaration(&mut self, dec: NodeId) -> GenResult {
        match self.tree.node(dec) {
            Node::VarDec { init, .. } => self.expr(*init),
            Node::FunDec(decl) => {
                let label = self.emitter.fresh_function_label();
                self.function_body(&label, decl)?;
                self.emitter.push_label(&label);
                Ok(())
            }
            Node::ClassDec { methods, .. } => self.class(methods),
            other => Err(CompilationError::internal(format!(
                "{} is not a declaration",
                other.kind_name()
            ))),
        }
    }

    fn function_body(&mut self, label: &str, decl: &FunctionDecl) -> GenResult {
        use OpCode::*;

        self.emitter.begin_function(label);
        self.emitter.emit(CopyFp);
        self.emitter.emit(LoadRa);
        for &dec in &decl.decs {
            self.declaration(dec)?;
        }
        self.expr(decl.body)?;
        self.emitter.emit(StoreTm);
        self.emitter.emit_n(Pop, decl.decs.len());
        self.emitter.emit(StoreRa);
        // Access link.
        self.emitter.emit(Pop);
        self.emitter.emit_n(Pop, decl.params.len());
        self.emitter.emit(StoreFp);
        self.emitter.emit(LoadTm);
        self.emitter.emit(LoadRa);
        self.emitter.emit(JumpSub);
        self.emitter.end_function();
        Ok(())
    }

    /// Lay out the dispatch table on the heap. The table base stays on the
    /// stack as the class's slot in the global frame.
    fn class(&mut self, methods: &[NodeId]) -> GenResult {
        use OpCode::*;

        let mut labels = Vec::with_capacity(methods.len());
        for &method in methods {
            let Node::MethodDec(decl) = self.tree.node(method) else {
                return Err(CompilationError::internal("class member is not a method"));
            };
            let label = self.emitter.fresh_function_label();
            self.function_body(&label, decl)?;
            labels.push(label);
        }

        self.emitter.emit(LoadHp);
        for label in &labels {
            self.emitter.push_label(label);
            self.emitter.emit(LoadHp);
            self.emitter.emit(StoreWord);
            self.bump_heap();
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, node: NodeId) -> GenResult {
        use OpCode::*;

        match self.tree.node(node) {
            Node::Int(value) => self.emitter.push_int(*value),
            Node::Bool(value) => self.emitter.push_int(Word::from(*value)),
            Node::Null => self.emitter.push_int(-1),

            Node::Binary { op, left, right } => self.binary(*op, *left, *right)?,
            Node::Not(operand) => {
                let labels = self.label_pair();
                self.expr(*operand)?;
                self.emitter.push_int(0);
                self.select(labels, BranchEq, 1, 0);
            }
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let (then_label, end_label) = self.label_pair();
                self.expr(*cond)?;
                self.emitter.push_int(1);
                self.emitter.jump(BranchEq, &then_label);
                self.expr(*else_branch)?;
                self.emitter.jump(Branch, &end_label);
                self.emitter.place(&then_label);
                self.expr(*then_branch)?;
                self.emitter.place(&end_label);
            }
            Node::Print(operand) => {
                self.expr(*operand)?;
                self.emitter.emit(Print);
            }

            Node::Id(_) => {
                let (hops, entry) = self.resolved(node)?;
                self.frame_of(hops);
                self.emitter.push_int(entry.offset);
                self.emitter.emit(Add);
                self.emitter.emit(LoadWord);
            }
            Node::Call { args, .. } => {
                let (hops, entry) = self.resolved(node)?;
                self.emitter.emit(LoadFp);
                self.args_reversed(args)?;
                self.frame_of(hops);
                self.duplicate_top();
                if matches!(entry.ty, Type::Method(_)) {
                    // The access link is an object pointer: go through its
                    // dispatch table.
                    self.emitter.emit(LoadWord);
                }
                self.emitter.push_int(entry.offset);
                self.emitter.emit(Add);
                self.emitter.emit(LoadWord);
                self.emitter.emit(JumpSub);
            }
            Node::DotCall { args, .. } => {
                let (hops, object) = self.resolved(node)?;
                let method = self.tables.method_entry(node).ok_or_else(|| {
                    CompilationError::internal("method call without a method entry")
                })?;
                self.emitter.emit(LoadFp);
                self.args_reversed(args)?;
                self.frame_of(hops);
                self.emitter.push_int(object.offset);
                self.emitter.emit(Add);
                self.emitter.emit(LoadWord);
                self.duplicate_top();
                self.emitter.emit(LoadWord);
                self.emitter.push_int(method.offset);
                self.emitter.emit(Add);
                self.emitter.emit(LoadWord);
                self.emitter.emit(JumpSub);
            }
            Node::New { args, .. } => {
                let (_, class) = self.resolved(node)?;
                for &arg in args {
                    self.expr(arg)?;
                }
                for _ in args {
                    self.emitter.emit(LoadHp);
                    self.emitter.emit(StoreWord);
                    self.bump_heap();
                }
                // Dispatch pointer, read from the class slot of the global frame.
                self.emitter.push_int(self.options.memory_size);
                self.emitter.push_int(class.offset);
                self.emitter.emit(Add);
                self.emitter.emit(LoadWord);
                self.emitter.emit(LoadHp);
                self.emitter.emit(StoreWord);
                // Object pointer.
                self.emitter.emit(LoadHp);
                self.bump_heap();
            }

            other => {
                return Err(CompilationError::internal(format!(
                    "{} is not an expression",
                    other.kind_name()
                )));
            }
        }
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> GenResult {
        use OpCode::*;

        match op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Div => {
                self.expr(left)?;
                self.expr(right)?;
                self.emitter.emit(match op {
                    BinaryOp::Plus => Add,
                    BinaryOp::Minus => Sub,
                    BinaryOp::Times => Mult,
                    _ => Div,
                });
            }
            BinaryOp::Equal => {
                let labels = self.label_pair();
                self.expr(left)?;
                self.expr(right)?;
                self.select(labels, BranchEq, 1, 0);
            }
            BinaryOp::LessEqual => {
                let labels = self.label_pair();
                self.expr(left)?;
                self.expr(right)?;
                self.select(labels, BranchLessEq, 1, 0);
            }
            BinaryOp::GreaterEqual => {
                // left >= right  <=>  !(left - right + 1 <= 0)
                let labels = self.label_pair();
                self.expr(left)?;
                self.expr(right)?;
                self.emitter.emit(Sub);
                self.emitter.push_int(1);
                self.emitter.emit(Add);
                self.emitter.push_int(0);
                self.select(labels, BranchLessEq, 0, 1);
            }
            BinaryOp::And | BinaryOp::Or => {
                // Short-circuit on the absorbing value.
                let absorbing = Word::from(op == BinaryOp::Or);
                let (short, end) = self.label_pair();
                self.expr(left)?;
                self.emitter.push_int(absorbing);
                self.emitter.jump(BranchEq, &short);
                self.expr(right)?;
                self.emitter.push_int(absorbing);
                self.emitter.jump(BranchEq, &short);
                self.emitter.push_int(1 - absorbing);
                self.emitter.jump(Branch, &end);
                self.emitter.place(&short);
                self.emitter.push_int(absorbing);
                self.emitter.place(&end);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Two branch labels, taken before the operands are lowered so that
    /// numbering follows the nesting of the source.
    fn label_pair(&mut self) -> (String, String) {
        (self.emitter.fresh_label(), self.emitter.fresh_label())
    }

    /// `branch taken; push otherwise; b end; taken: push if_taken; end:`
    fn select(
        &mut self,
        (taken, end): (String, String),
        branch: OpCode,
        if_taken: Word,
        otherwise: Word,
    ) {
        self.emitter.jump(branch, &taken);
        self.emitter.push_int(otherwise);
        self.emitter.jump(OpCode::Branch, &end);
        self.emitter.place(&taken);
        self.emitter.push_int(if_taken);
        self.emitter.place(&end);
    }

    fn args_reversed(&mut self, args: &[NodeId]) -> GenResult {
        for &arg in args.iter().rev() {
            self.expr(arg)?;
        }
        Ok(())
    }

    /// Push the frame pointer `hops` static links out.
    fn frame_of(&mut self, hops: u32) {
        self.emitter.emit(OpCode::LoadFp);
        self.emitter.emit_n(OpCode::LoadWord, hops as usize);
    }

    fn duplicate_top(&mut self) {
        self.emitter.emit(OpCode::StoreTm);
        self.emitter.emit(OpCode::LoadTm);
        self.emitter.emit(OpCode::LoadTm);
    }

    /// `hp := hp + 1`
    fn bump_heap(&mut self) {
        self.emitter.emit(OpCode::LoadHp);
        self.emitter.push_int(1);
        self.emitter.emit(OpCode::Add);
        self.emitter.emit(OpCode::StoreHp);
    }

    fn resolved(&self, node: NodeId) -> Result<(u32, &'t SymbolEntry), CompilationError> {
        let tables = self.tables;
        let entry = tables.use_entry(node);
        let hops = tables.hops(node);
        match (hops, entry) {
            (Some(hops), Some(entry)) => Ok((hops, entry)),
            _ => Err(CompilationError::internal(format!(
                "{} at {} has no resolved entry",
                self.tree.node(node).kind_name(),
                self.tree.span(node)
            ))),
        }
    }
}
