//! Type Check Pass - compute and validate expression types.
//!
//! Expression checks short-circuit: the first failure inside an expression
//! aborts it. Declarations are the recovery points. Each declaration in a
//! `let` list (and each method of a class) is checked on its own, its failure
//! is collected, and checking continues with the next one.
//!
//! A failure is either a reported [`CompilationError`] or
//! [`CheckFailure::Incomplete`]: the check ran into a type the symbol table
//! could not resolve. The cause was reported there, so incomplete checks are
//! dropped without a second diagnostic.

use fool_core::CompilationError;
use fool_parser::ast::{ArrowType, BinaryOp, FunctionDecl, Ident, Node, NodeId, Tree, Type};

use crate::subtyping::is_subtype;
use crate::unit::{CompilationUnit, SideTables, Stage};

/// Output of the type check pass.
#[derive(Debug, Default)]
pub struct TypeCheckOutput {
    /// Type of the program's main expression, if it checked.
    pub program_type: Option<Type>,
    /// Every error collected, in source order.
    pub errors: Vec<CompilationError>,
}

/// Why a check produced no type.
#[derive(Debug)]
enum CheckFailure {
    /// A component type is unresolved.
    Incomplete,
    Error(CompilationError),
}

impl From<CompilationError> for CheckFailure {
    fn from(err: CompilationError) -> Self {
        CheckFailure::Error(err)
    }
}

type CheckResult<T = Type> = Result<T, CheckFailure>;

/// Pass 2: type check.
pub struct TypeCheckPass<'a> {
    unit: &'a mut CompilationUnit,
}

impl<'a> TypeCheckPass<'a> {
    pub const NAME: &'static str = "type check";

    pub fn new(unit: &'a mut CompilationUnit) -> Self {
        Self { unit }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> TypeCheckOutput {
        if let Err(err) = self.unit.require_stage(Self::NAME, Stage::Resolved) {
            return TypeCheckOutput {
                program_type: None,
                errors: vec![err],
            };
        }

        let (tree, tables) = self.unit.parts_mut();
        let mut checker = Checker { tree, tables };
        let output = match tree.root() {
            Some(root) => checker.check_program(root),
            None => TypeCheckOutput {
                program_type: None,
                errors: vec![CompilationError::internal("tree has no root")],
            },
        };

        self.unit.advance(Stage::Checked);
        output
    }
}

// ============================================================================
// Checker
// ============================================================================

struct Checker<'t> {
    tree: &'t Tree,
    tables: &'t mut SideTables,
}

impl Checker<'_> {
    fn check_program(&mut self, root: NodeId) -> TypeCheckOutput {
        let tree = self.tree;
        let (mut errors, body) = match tree.node(root) {
            Node::Prog { body } => (Vec::new(), *body),
            Node::LetInProg {
                classes,
                decs,
                body,
            } => {
                let mut errors = self.check_declarations(classes);
                errors.extend(self.check_declarations(decs));
                (errors, *body)
            }
            other => {
                let message = format!("{} is not a program", other.kind_name());
                return TypeCheckOutput {
                    program_type: None,
                    errors: vec![CompilationError::internal(message)],
                };
            }
        };

        let program_type = match self.check(body) {
            Ok(ty) => Some(ty),
            Err(CheckFailure::Error(err)) => {
                errors.push(err);
                None
            }
            Err(CheckFailure::Incomplete) => None,
        };

        TypeCheckOutput {
            program_type,
            errors,
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Check a list of declarations, each on its own.
    fn check_declarations(&mut self, decs: &[NodeId]) -> Vec<CompilationError> {
        let mut errors = Vec::new();
        for &dec in decs {
            let (nested, own) = self.check_declaration(dec);
            errors.extend(nested);
            if let Err(CheckFailure::Error(err)) = own {
                errors.push(err);
            }
        }
        errors
    }

    /// Check one declaration. Returns the errors collected from the
    /// declarations nested inside it, and its own outcome.
    fn check_declaration(&mut self, dec: NodeId) -> (Vec<CompilationError>, CheckResult<()>) {
        let tree = self.tree;
        match tree.node(dec) {
            Node::VarDec { id, init, .. } => (Vec::new(), self.check_var(dec, id, *init)),
            Node::FunDec(decl) => {
                let nested = self.check_declarations(&decl.decs);
                (nested, self.check_function(dec, decl, "function"))
            }
            Node::MethodDec(decl) => {
                let nested = self.check_declarations(&decl.decs);
                (nested, self.check_function(dec, decl, "method"))
            }
            // An incomplete field type was already reported by the symbol
            // table; only the methods can fail here.
            Node::ClassDec { methods, .. } => (self.check_declarations(methods), Ok(())),
            other => (
                Vec::new(),
                Err(CompilationError::internal(format!(
                    "{} is not a declaration",
                    other.kind_name()
                ))
                .into()),
            ),
        }
    }

    fn check_var(&mut self, dec: NodeId, id: &Ident, init: NodeId) -> CheckResult<()> {
        let value = self.check(init)?;
        let declared = self.declared_type(dec)?;
        if !is_subtype(&value, &declared) {
            return Err(self.mismatch(
                format!("Incompatible value for variable {}", id.name),
                dec,
            ));
        }
        Ok(())
    }

    fn check_function(&mut self, dec: NodeId, decl: &FunctionDecl, what: &str) -> CheckResult<()> {
        let body = self.check(decl.body)?;
        let ret = match self.declared_type(dec)? {
            Type::Arrow(arrow) | Type::Method(arrow) => *arrow.ret,
            _ => return Err(CheckFailure::Incomplete),
        };
        if !is_subtype(&body, &ret) {
            return Err(self.mismatch(
                format!("Wrong return type for {} {}", what, decl.id.name),
                dec,
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Check an expression and record its type.
    fn check(&mut self, node: NodeId) -> CheckResult {
        let ty = self.compute(node)?;
        self.tables.set_type(node, ty.clone());
        Ok(ty)
    }

    fn compute(&mut self, node: NodeId) -> CheckResult {
        let tree = self.tree;
        match tree.node(node) {
            Node::Int(_) => Ok(Type::Int),
            Node::Bool(_) => Ok(Type::Bool),
            Node::Null => Ok(Type::Empty),

            Node::Binary { op, left, right } => self.check_binary(node, *op, *left, *right),
            Node::Not(operand) => {
                if !matches!(self.check(*operand)?, Type::Bool) {
                    return Err(self.mismatch("Incompatible types in not", node));
                }
                Ok(Type::Bool)
            }
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.check(*cond)?;
                if !is_subtype(&cond, &Type::Bool) {
                    return Err(self.mismatch("Non boolean condition in if", node));
                }
                let then_ty = self.check(*then_branch)?;
                let else_ty = self.check(*else_branch)?;
                if is_subtype(&then_ty, &else_ty) {
                    Ok(else_ty)
                } else if is_subtype(&else_ty, &then_ty) {
                    Ok(then_ty)
                } else {
                    Err(self.mismatch("Incompatible types in then-else branches", node))
                }
            }
            Node::Print(operand) => self.check(*operand),

            Node::Id(id) => {
                let ty = self.used_type(node)?;
                if matches!(ty, Type::Arrow(_) | Type::Method(_) | Type::Class(_)) {
                    return Err(self.mismatch(
                        format!("Wrong usage of function identifier {}", id.name),
                        node,
                    ));
                }
                Ok(ty)
            }
            Node::Call { id, args } => {
                let arrow = match self.used_type(node)? {
                    Type::Arrow(arrow) | Type::Method(arrow) => arrow,
                    _ => {
                        return Err(self.mismatch(
                            format!("Invocation of a non-function {}", id.name),
                            node,
                        ));
                    }
                };
                self.check_invocation(node, &arrow, args, &id.name)
            }
            Node::DotCall { method, args, .. } => {
                let ty = match self.tables.method_entry(node) {
                    Some(entry) if entry.ty.is_complete() => entry.ty.clone(),
                    _ => return Err(CheckFailure::Incomplete),
                };
                let Type::Method(arrow) = ty else {
                    return Err(self.mismatch(
                        format!("Invocation of a non-function {}", method.name),
                        node,
                    ));
                };
                self.check_invocation(node, &arrow, args, &method.name)
            }
            Node::New { class, args } => {
                let Type::Class(layout) = self.used_type(node)? else {
                    return Err(CheckFailure::Incomplete);
                };
                if layout.fields.len() != args.len() {
                    return Err(self.mismatch(
                        format!(
                            "Wrong number of parameters in the creation of an object of class {}",
                            class.name
                        ),
                        node,
                    ));
                }
                for (i, (&arg, field)) in args.iter().zip(&layout.fields).enumerate() {
                    let arg_ty = self.check(arg)?;
                    if !is_subtype(&arg_ty, field) {
                        return Err(self.mismatch(
                            format!(
                                "Wrong type for {}-th parameter in the creation of an object of class {}",
                                i + 1,
                                class.name
                            ),
                            node,
                        ));
                    }
                }
                Ok(Type::Ref(class.name.clone()))
            }

            other => Err(CompilationError::internal(format!(
                "{} is not an expression",
                other.kind_name()
            ))
            .into()),
        }
    }

    fn check_binary(&mut self, node: NodeId, op: BinaryOp, left: NodeId, right: NodeId) -> CheckResult {
        match op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Div => {
                let message = match op {
                    BinaryOp::Plus => "Non integers in sum",
                    BinaryOp::Minus => "Non integers in minus",
                    BinaryOp::Times => "Non integers in multiplication",
                    _ => "Non integers in division",
                };
                // Arithmetic takes integers only; booleans are not widened here.
                for operand in [left, right] {
                    if !matches!(self.check(operand)?, Type::Int) {
                        return Err(self.mismatch(message, node));
                    }
                }
                Ok(Type::Int)
            }
            BinaryOp::And | BinaryOp::Or => {
                let message = if op == BinaryOp::And {
                    "Incompatible types in and"
                } else {
                    "Incompatible types in or"
                };
                for operand in [left, right] {
                    if !matches!(self.check(operand)?, Type::Bool) {
                        return Err(self.mismatch(message, node));
                    }
                }
                Ok(Type::Bool)
            }
            BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                let message = if op == BinaryOp::LessEqual {
                    "Incompatible types in less equal"
                } else {
                    "Incompatible types in greater equal"
                };
                for operand in [left, right] {
                    if !matches!(self.check(operand)?, Type::Int) {
                        return Err(self.mismatch(message, node));
                    }
                }
                Ok(Type::Bool)
            }
            BinaryOp::Equal => {
                let l = self.check(left)?;
                let r = self.check(right)?;
                if !(is_subtype(&l, &r) || is_subtype(&r, &l)) {
                    return Err(self.mismatch("Incompatible types in equal", node));
                }
                Ok(Type::Bool)
            }
        }
    }

    fn check_invocation(
        &mut self,
        node: NodeId,
        arrow: &ArrowType,
        args: &[NodeId],
        name: &str,
    ) -> CheckResult {
        if arrow.params.len() != args.len() {
            return Err(self.mismatch(
                format!("Wrong number of parameters in the invocation of {}", name),
                node,
            ));
        }
        for (i, (&arg, param)) in args.iter().zip(&arrow.params).enumerate() {
            let arg_ty = self.check(arg)?;
            if !is_subtype(&arg_ty, param) {
                return Err(self.mismatch(
                    format!("Wrong type for {}-th parameter in the invocation of {}", i + 1, name),
                    node,
                ));
            }
        }
        Ok((*arrow.ret).clone())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Type of the entry a declaration node owns.
    fn declared_type(&self, node: NodeId) -> CheckResult {
        complete(self.tables.declaration(node).map(|entry| &entry.ty))
    }

    /// Type of the entry a use resolves to.
    fn used_type(&self, node: NodeId) -> CheckResult {
        complete(self.tables.use_entry(node).map(|entry| &entry.ty))
    }

    fn mismatch(&self, message: impl Into<String>, node: NodeId) -> CheckFailure {
        CheckFailure::Error(CompilationError::mismatch(message, self.tree.span(node)))
    }
}

fn complete(ty: Option<&Type>) -> CheckResult {
    match ty {
        Some(ty) if ty.is_complete() => Ok(ty.clone()),
        _ => Err(CheckFailure::Incomplete),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::SymbolTablePass;
    use fool_parser::Parser;

    fn check(source: &str) -> (CompilationUnit, TypeCheckOutput) {
        let mut unit = CompilationUnit::new(Parser::parse(source).unwrap());
        let resolved = SymbolTablePass::new(&mut unit).run();
        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        let output = TypeCheckPass::new(&mut unit).run();
        (unit, output)
    }

    fn messages(output: &TypeCheckOutput) -> Vec<String> {
        output
            .errors
            .iter()
            .map(|err| match err {
                CompilationError::TypeMismatch { message, .. } => message.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    fn program_type(source: &str) -> Type {
        let (_, output) = check(source);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        output.program_type.unwrap()
    }

    fn single_error(source: &str) -> String {
        let (_, output) = check(source);
        let messages = messages(&output);
        assert_eq!(messages.len(), 1, "{:?}", messages);
        messages.into_iter().next().unwrap()
    }

    #[test]
    fn literals_and_operators() {
        assert_eq!(program_type("print(2 + 3 * 4);"), Type::Int);
        assert_eq!(program_type("1 <= 2 && !false;"), Type::Bool);
        assert_eq!(program_type("null;"), Type::Empty);
        assert_eq!(program_type("true == 1;"), Type::Bool);
        assert_eq!(program_type("10 >= 2 || false;"), Type::Bool);
    }

    #[test]
    fn arithmetic_rejects_booleans() {
        let (_, output) = check("true + 1;");
        assert_eq!(output.program_type, None);
        assert_eq!(messages(&output), vec!["Non integers in sum"]);

        assert_eq!(single_error("1 - false;"), "Non integers in minus");
        assert_eq!(single_error("true * 2;"), "Non integers in multiplication");
        assert_eq!(single_error("4 / null;"), "Non integers in division");
    }

    #[test]
    fn logic_and_comparisons_are_exact() {
        assert_eq!(single_error("1 && true;"), "Incompatible types in and");
        assert_eq!(single_error("true || 0;"), "Incompatible types in or");
        assert_eq!(single_error("!3;"), "Incompatible types in not");
        assert_eq!(single_error("true <= 1;"), "Incompatible types in less equal");
        assert_eq!(single_error("1 >= false;"), "Incompatible types in greater equal");
    }

    #[test]
    fn if_takes_the_more_general_branch() {
        assert_eq!(program_type("if true then {1} else {2};"), Type::Int);
        assert_eq!(program_type("if true then {true} else {1};"), Type::Int);
        assert_eq!(program_type("if 1 == 1 then {false} else {true};"), Type::Bool);
        assert_eq!(single_error("if 1 then {1} else {2};"), "Non boolean condition in if");
    }

    #[test]
    fn if_branches_must_be_related() {
        let source = "let class C () { } in if true then {new C()} else {1};";
        assert_eq!(single_error(source), "Incompatible types in then-else branches");
        let source = "let class C () { } in if true then {null} else {new C()};";
        assert_eq!(program_type(source), Type::Ref("C".into()));
    }

    #[test]
    fn declarations() {
        assert_eq!(
            program_type("let var b:int = true; fun f:bool (x:int) x == 1; in f(b);"),
            Type::Bool
        );
        assert_eq!(
            single_error("let var x:bool = 1; in 0;"),
            "Incompatible value for variable x"
        );
        assert_eq!(
            single_error("let fun f:bool () 1; in 0;"),
            "Wrong return type for function f"
        );
    }

    #[test]
    fn calls() {
        assert_eq!(
            single_error("let fun f:int (a:int) a; in f();"),
            "Wrong number of parameters in the invocation of f"
        );
        assert_eq!(
            single_error("let fun f:int (a:int, b:bool) a; in f(1, 2);"),
            "Wrong type for 2-th parameter in the invocation of f"
        );
        assert_eq!(
            single_error("let var x:int = 1; in x(1);"),
            "Invocation of a non-function x"
        );
        assert_eq!(
            single_error("let fun f:int () 1; in f + 1;"),
            "Wrong usage of function identifier f"
        );
    }

    #[test]
    fn objects() {
        let source = "let class P (x:int, y:int) { \
                        fun sum:int () x + y; \
                        fun same:bool (o:P) o == null; \
                      } \
                      var p:P = new P(1, 2); \
                      in p.sum();";
        assert_eq!(program_type(source), Type::Int);

        assert_eq!(
            single_error("let class P (x:int) { } in new P(1, 2);"),
            "Wrong number of parameters in the creation of an object of class P"
        );
        assert_eq!(
            single_error("let class P (x:int, y:bool) { } in new P(1, 2);"),
            "Wrong type for 2-th parameter in the creation of an object of class P"
        );
        assert_eq!(
            single_error(
                "let class P () { fun m:int (a:int) a; } var p:P = new P(); in p.m(true, 1);"
            ),
            "Wrong number of parameters in the invocation of m"
        );
    }

    #[test]
    fn sibling_declarations_keep_being_checked() {
        let source = "let class C () { \
                        fun a:int () true && 1; \
                        fun b:bool () 2; \
                      } \
                      fun f:int () \
                        let var bad:bool = 3; \
                            var fine:int = 4; \
                        in fine; \
                      var g:int = f(); \
                      in g + false;";
        let (_, output) = check(source);
        assert_eq!(
            messages(&output),
            vec![
                "Incompatible types in and",
                "Wrong return type for method b",
                "Incompatible value for variable bad",
                "Non integers in sum",
            ]
        );
        assert_eq!(output.program_type, None);
    }

    #[test]
    fn records_expression_types() {
        let (unit, output) = check("let var x:int = 1; in print(x <= 2);");
        assert!(output.errors.is_empty());
        let (print, _) = unit
            .tree()
            .iter()
            .find(|(_, node)| matches!(node, Node::Print(_)))
            .unwrap();
        assert_eq!(unit.tables().type_of(print), Some(&Type::Bool));
        assert_eq!(unit.stage(), Stage::Checked);
    }

    #[test]
    fn incomplete_types_are_skipped_silently() {
        let mut unit =
            CompilationUnit::new(Parser::parse("let var c:D = null; var x:int = 1; in x;").unwrap());
        let resolved = SymbolTablePass::new(&mut unit).run();
        assert_eq!(resolved.errors.len(), 1);

        let output = TypeCheckPass::new(&mut unit).run();
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.program_type, Some(Type::Int));
    }

    #[test]
    fn unresolved_body_leaves_program_untyped() {
        let mut unit = CompilationUnit::new(Parser::parse("missing + 1;").unwrap());
        assert_eq!(SymbolTablePass::new(&mut unit).run().errors.len(), 1);

        let output = TypeCheckPass::new(&mut unit).run();
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.program_type, None);
    }

    #[test]
    fn requires_resolved_unit_and_runs_once() {
        let mut unit = CompilationUnit::new(Parser::parse("1;").unwrap());
        let early = TypeCheckPass::new(&mut unit).run();
        assert!(matches!(
            early.errors.as_slice(),
            [CompilationError::PassOrder { expected: "resolved", found: "parsed", .. }]
        ));

        SymbolTablePass::new(&mut unit).run();
        assert!(TypeCheckPass::new(&mut unit).run().errors.is_empty());
        let again = TypeCheckPass::new(&mut unit).run();
        assert!(matches!(
            again.errors.as_slice(),
            [CompilationError::PassOrder { pass: "type check", .. }]
        ));
    }
}
