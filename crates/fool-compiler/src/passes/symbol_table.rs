//! Symbol Table Pass - bind every declaration and every use to an entry.
//!
//! This pass walks the tree once, depth first, keeping a stack of open
//! scopes. Each declaration receives a [`SymbolEntry`] holding its resolved
//! type, the nesting level of the scope it lives in and its offset inside
//! that scope's frame. Each use of a name is bound to the entry it resolves
//! to, together with the nesting level of the use itself; the difference is
//! the number of static links the generated code has to follow.
//!
//! ## Frame layout
//!
//! ```text
//! program let (level 0)   fp = MEMSIZE, sentinel at -1, declarations -2, -3, ...
//! function body (n + 1)   params 1, 2, ...; access link 0; return address -1;
//!                         locals -2, -3, ...
//! class body (level 1)    field i at -(i + 1) below the object pointer,
//!                         method j at dispatch offset j
//! method body (level 2)   as a function body, access link = object pointer
//! ```
//!
//! Errors never stop the walk. An unresolvable name is bound to a placeholder
//! entry with an incomplete type, which the type checker skips silently.

use fool_core::{CompilationError, Word};
use fool_parser::ast::{
    ArrowType, ClassType, FunctionDecl, Ident, Node, NodeId, Tree, Type, TypeAnnot,
};
use rustc_hash::FxHashMap;

use crate::scope::{Scope, ScopeStack};
use crate::unit::{CompilationUnit, EntryId, SideTables, Stage, SymbolEntry};

/// Offset of the first declaration in a program `let` or a function body.
/// Slot `-1` holds the sentinel (program) or the return address (function).
const FIRST_LOCAL_OFFSET: Word = -2;

/// Output of the symbol table pass.
#[derive(Debug, Default)]
pub struct SymbolTableOutput {
    /// Number of entries created, placeholders included.
    pub entries_created: usize,
    /// Collected errors (the walk continues past each of them).
    pub errors: Vec<CompilationError>,
}

/// Pass 1: resolve names.
pub struct SymbolTablePass<'a> {
    unit: &'a mut CompilationUnit,
}

impl<'a> SymbolTablePass<'a> {
    pub const NAME: &'static str = "symbol table";

    pub fn new(unit: &'a mut CompilationUnit) -> Self {
        Self { unit }
    }

    /// Run the pass. A unit that is not freshly parsed is left untouched and
    /// the output holds a single [`CompilationError::PassOrder`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> SymbolTableOutput {
        if let Err(err) = self.unit.require_stage(Self::NAME, Stage::Parsed) {
            return SymbolTableOutput {
                entries_created: 0,
                errors: vec![err],
            };
        }

        let (tree, tables) = self.unit.parts_mut();
        let before = tables.entry_count();
        let mut resolver = Resolver::new(tree, tables);
        match tree.root() {
            Some(root) => resolver.visit(root),
            None => resolver
                .errors
                .push(CompilationError::internal("tree has no root")),
        }
        let errors = resolver.errors;
        let entries_created = tables.entry_count() - before;

        self.unit.advance(Stage::Resolved);
        SymbolTableOutput {
            entries_created,
            errors,
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// What a `new` or a method call needs to know about a declared class.
#[derive(Debug)]
struct ClassInfo {
    entry: EntryId,
    methods: FxHashMap<String, EntryId>,
}

struct Resolver<'t> {
    tree: &'t Tree,
    tables: &'t mut SideTables,
    scopes: ScopeStack,
    classes: FxHashMap<String, ClassInfo>,
    /// Class whose header is being resolved; its own name is a valid type
    /// inside it before the class is registered.
    declaring_class: Option<String>,
    errors: Vec<CompilationError>,
}

impl<'t> Resolver<'t> {
    fn new(tree: &'t Tree, tables: &'t mut SideTables) -> Self {
        Self {
            tree,
            tables,
            scopes: ScopeStack::new(),
            classes: FxHashMap::default(),
            declaring_class: None,
            errors: Vec::new(),
        }
    }

    fn visit(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.node(node) {
            Node::Prog { body } => {
                self.scopes.push(Scope::new(FIRST_LOCAL_OFFSET));
                self.visit(*body);
                self.scopes.pop();
            }
            Node::LetInProg {
                classes,
                decs,
                body,
            } => {
                self.scopes.push(Scope::new(FIRST_LOCAL_OFFSET));
                for &class in classes {
                    self.visit(class);
                }
                for &dec in decs {
                    self.visit(dec);
                }
                self.visit(*body);
                self.scopes.pop();
            }

            Node::VarDec { id, ty, init } => {
                // The initializer cannot see the variable it initializes.
                self.visit(*init);
                let ty = self.resolve_type(ty);
                let offset = self.allocate_offset();
                let entry = SymbolEntry::new(ty, self.scopes.level(), offset);
                self.declare(node, id, entry);
            }
            Node::FunDec(decl) => {
                let signature = self.signature(decl);
                let offset = self.allocate_offset();
                let entry = SymbolEntry::new(
                    Type::Arrow(signature.clone()),
                    self.scopes.level(),
                    offset,
                );
                self.declare(node, &decl.id, entry);
                self.visit_body(decl, &signature);
            }
            Node::ClassDec { .. } => self.visit_class(node),
            // Bound by their enclosing declaration.
            Node::MethodDec(_) | Node::Param { .. } | Node::Field { .. } => {}

            Node::Int(_) | Node::Bool(_) | Node::Null => {}
            Node::Binary { left, right, .. } => {
                self.visit(*left);
                self.visit(*right);
            }
            Node::Not(operand) | Node::Print(operand) => self.visit(*operand),
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit(*cond);
                self.visit(*then_branch);
                self.visit(*else_branch);
            }

            Node::Id(id) => {
                self.bind_use(node, id);
            }
            Node::Call { id, args } => {
                self.visit_all(args);
                self.bind_use(node, id);
            }
            Node::New { class, args } => {
                self.visit_all(args);
                match self.classes.get(&class.name) {
                    Some(info) => {
                        let entry = info.entry;
                        self.tables.bind_use(node, entry, self.scopes.level());
                    }
                    None => self.errors.push(CompilationError::UnknownClass {
                        name: class.name.clone(),
                        span: class.span,
                    }),
                }
            }
            Node::DotCall {
                object,
                method,
                args,
            } => {
                self.visit_all(args);
                self.visit_dot_call(node, object, method);
            }
        }
    }

    fn visit_all(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            self.visit(node);
        }
    }

    /// Open the scope of a function or method body: parameters, local
    /// declarations, then the body expression.
    fn visit_body(&mut self, decl: &FunctionDecl, signature: &ArrowType) {
        let tree = self.tree;
        self.scopes.push(Scope::new(FIRST_LOCAL_OFFSET));
        let level = self.scopes.level();

        for (i, &param) in decl.params.iter().enumerate() {
            if let Node::Param { id, .. } = tree.node(param) {
                let ty = signature.params.get(i).cloned().unwrap_or(Type::Unresolved);
                self.declare(param, id, SymbolEntry::new(ty, level, i as Word + 1));
            }
        }
        for &dec in &decl.decs {
            self.visit(dec);
        }
        self.visit(decl.body);

        self.scopes.pop();
    }

    fn visit_class(&mut self, node: NodeId) {
        let tree = self.tree;
        let Node::ClassDec {
            id,
            fields,
            methods,
        } = tree.node(node)
        else {
            return;
        };

        // Header: member types may mention the class itself.
        self.declaring_class = Some(id.name.clone());
        let field_types: Vec<Type> = fields
            .iter()
            .map(|&field| match tree.node(field) {
                Node::Field { ty, .. } => self.resolve_type(ty),
                _ => Type::Unresolved,
            })
            .collect();
        let mut method_decls = Vec::with_capacity(methods.len());
        for &method in methods {
            if let Node::MethodDec(decl) = tree.node(method) {
                let signature = self.signature(decl);
                method_decls.push((method, decl, signature));
            }
        }
        self.declaring_class = None;

        let class_type = ClassType {
            fields: field_types.clone(),
            methods: method_decls.iter().map(|(_, _, sig)| sig.clone()).collect(),
        };
        let offset = self.allocate_offset();
        let class_entry = self.declare(
            node,
            id,
            SymbolEntry::new(Type::Class(class_type), self.scopes.level(), offset),
        );

        // Class scope: every member is declared before any method body is
        // visited, so methods can call each other regardless of order.
        self.scopes.push(Scope::new(FIRST_LOCAL_OFFSET));
        let level = self.scopes.level();
        for (i, (&field, ty)) in fields.iter().zip(field_types).enumerate() {
            if let Node::Field { id, .. } = tree.node(field) {
                let offset = -(i as Word + 1);
                self.declare(field, id, SymbolEntry::new(ty, level, offset));
            }
        }
        let mut method_table = FxHashMap::default();
        for (j, (method, decl, signature)) in method_decls.iter().enumerate() {
            let entry = SymbolEntry::new(Type::Method(signature.clone()), level, j as Word);
            let entry = self.declare(*method, &decl.id, entry);
            method_table.entry(decl.id.name.clone()).or_insert(entry);
        }

        self.classes
            .entry(id.name.clone())
            .or_insert(ClassInfo {
                entry: class_entry,
                methods: method_table,
            });

        for (_, decl, signature) in &method_decls {
            self.visit_body(decl, signature);
        }
        self.scopes.pop();
    }

    fn visit_dot_call(&mut self, node: NodeId, object: &Ident, method: &Ident) {
        let entry = self.bind_use(node, object);
        let object_type = self.tables.entry(entry).map(|e| e.ty.clone());
        match object_type {
            Some(Type::Ref(class)) => {
                let method_entry = self
                    .classes
                    .get(&class)
                    .and_then(|info| info.methods.get(&method.name))
                    .copied();
                match method_entry {
                    Some(entry) => self.tables.bind_method(node, entry),
                    None => self.errors.push(CompilationError::UnknownMethod {
                        class,
                        method: method.name.clone(),
                        span: method.span,
                    }),
                }
            }
            // Already reported where the name or its type failed to resolve.
            Some(Type::Unresolved) | None => {}
            Some(_) => self.errors.push(CompilationError::NotAnObject {
                name: object.name.clone(),
                span: object.span,
            }),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn allocate_offset(&mut self) -> Word {
        match self.scopes.current_mut() {
            Some(scope) => scope.allocate_offset(),
            None => {
                self.errors
                    .push(CompilationError::internal("declaration outside any scope"));
                0
            }
        }
    }

    /// Create the entry for a declaration node and bind its name in the
    /// innermost scope. A duplicate keeps its entry (and offset) but does not
    /// shadow the earlier binding.
    fn declare(&mut self, node: NodeId, id: &Ident, entry: SymbolEntry) -> EntryId {
        let entry = self.tables.add_entry(entry);
        self.tables.bind_declaration(node, entry);
        let fresh = self
            .scopes
            .current_mut()
            .is_some_and(|scope| scope.declare(&id.name, entry));
        if !fresh {
            self.errors.push(CompilationError::DuplicateDeclaration {
                name: id.name.clone(),
                span: id.span,
            });
        }
        entry
    }

    /// Bind a use of `id` at `node`. An undeclared name is reported and bound
    /// to a placeholder so the later passes still find an entry.
    fn bind_use(&mut self, node: NodeId, id: &Ident) -> EntryId {
        let level = self.scopes.level();
        let entry = match self.scopes.lookup(&id.name) {
            Some(entry) => entry,
            None => {
                self.errors.push(CompilationError::UndeclaredIdentifier {
                    name: id.name.clone(),
                    span: id.span,
                });
                self.tables.add_entry(SymbolEntry::placeholder(level))
            }
        };
        self.tables.bind_use(node, entry, level);
        entry
    }

    fn signature(&mut self, decl: &FunctionDecl) -> ArrowType {
        let tree = self.tree;
        let params = decl
            .params
            .iter()
            .map(|&param| match tree.node(param) {
                Node::Param { ty, .. } => self.resolve_type(ty),
                _ => Type::Unresolved,
            })
            .collect();
        let ret = self.resolve_type(&decl.ret);
        ArrowType::new(params, ret)
    }

    /// Check a written type. Class references must name a class declared
    /// earlier, or the class being declared.
    fn resolve_type(&mut self, annot: &TypeAnnot) -> Type {
        match &annot.ty {
            Type::Ref(name) => {
                let known = self.classes.contains_key(name)
                    || self.declaring_class.as_deref() == Some(name.as_str());
                if known {
                    Type::Ref(name.clone())
                } else {
                    self.errors.push(CompilationError::UnknownClass {
                        name: name.clone(),
                        span: annot.span,
                    });
                    Type::Unresolved
                }
            }
            ty => ty.clone(),
        }
    }
}
