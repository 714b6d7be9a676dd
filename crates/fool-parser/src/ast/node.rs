//! Tree node definitions.
//!
//! Nodes live in a [`Tree`](super::Tree) arena and refer to their children by
//! [`NodeId`]. Nothing here carries analysis results: passes record those in
//! side tables keyed by `NodeId`.

use std::fmt;

use fool_core::{Span, Word};

use super::ops::BinaryOp;
use super::types::Type;

/// Index of a node in its tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A name together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A type written in the source: `int`, `bool` or a class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnot {
    pub ty: Type,
    pub span: Span,
}

/// Shared shape of function and method declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: Ident,
    pub ret: TypeAnnot,
    /// [`Node::Param`] nodes.
    pub params: Vec<NodeId>,
    /// Local [`Node::VarDec`] / [`Node::FunDec`] nodes.
    pub decs: Vec<NodeId>,
    pub body: NodeId,
}

/// A tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // =========================================================================
    // Programs
    // =========================================================================
    /// `exp;`
    Prog { body: NodeId },
    /// `let classes decs in exp;`
    LetInProg {
        classes: Vec<NodeId>,
        decs: Vec<NodeId>,
        body: NodeId,
    },

    // =========================================================================
    // Declarations
    // =========================================================================
    /// `var id: ty = init;`
    VarDec {
        id: Ident,
        ty: TypeAnnot,
        init: NodeId,
    },
    /// `fun id: ret(params) let decs in body;`
    FunDec(FunctionDecl),
    /// A function declared inside a class body.
    MethodDec(FunctionDecl),
    /// `class id(fields) { methods }`
    ClassDec {
        id: Ident,
        fields: Vec<NodeId>,
        methods: Vec<NodeId>,
    },
    /// A function or method parameter.
    Param { id: Ident, ty: TypeAnnot },
    /// A class field.
    Field { id: Ident, ty: TypeAnnot },

    // =========================================================================
    // Expressions
    // =========================================================================
    Int(Word),
    Bool(bool),
    Null,
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Not(NodeId),
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
    Print(NodeId),
    Id(Ident),
    /// `f(args)`
    Call { id: Ident, args: Vec<NodeId> },
    /// `object.method(args)`
    DotCall {
        object: Ident,
        method: Ident,
        args: Vec<NodeId>,
    },
    /// `new Class(args)`
    New { class: Ident, args: Vec<NodeId> },
}

impl Node {
    /// Name of the node kind, as shown by the tree printer.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Prog { .. } => "Prog",
            Node::LetInProg { .. } => "LetInProg",
            Node::VarDec { .. } => "VarDec",
            Node::FunDec(_) => "FunDec",
            Node::MethodDec(_) => "MethodDec",
            Node::ClassDec { .. } => "ClassDec",
            Node::Param { .. } => "Param",
            Node::Field { .. } => "Field",
            Node::Int(_) => "Int",
            Node::Bool(_) => "Bool",
            Node::Null => "Null",
            Node::Binary { op, .. } => op.node_name(),
            Node::Not(_) => "Not",
            Node::If { .. } => "If",
            Node::Print(_) => "Print",
            Node::Id(_) => "Id",
            Node::Call { .. } => "Call",
            Node::DotCall { .. } => "DotCall",
            Node::New { .. } => "New",
        }
    }

    /// Child nodes in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Prog { body } => vec![*body],
            Node::LetInProg {
                classes,
                decs,
                body,
            } => classes
                .iter()
                .chain(decs.iter())
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            Node::VarDec { init, .. } => vec![*init],
            Node::FunDec(decl) | Node::MethodDec(decl) => decl
                .params
                .iter()
                .chain(decl.decs.iter())
                .copied()
                .chain(std::iter::once(decl.body))
                .collect(),
            Node::ClassDec {
                fields, methods, ..
            } => fields.iter().chain(methods.iter()).copied().collect(),
            Node::Param { .. }
            | Node::Field { .. }
            | Node::Int(_)
            | Node::Bool(_)
            | Node::Null
            | Node::Id(_) => Vec::new(),
            Node::Binary { left, right, .. } => vec![*left, *right],
            Node::Not(operand) | Node::Print(operand) => vec![*operand],
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => vec![*cond, *then_branch, *else_branch],
            Node::Call { args, .. } | Node::DotCall { args, .. } | Node::New { args, .. } => {
                args.clone()
            }
        }
    }

    /// The declared or referenced name, for nodes that have one.
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Node::VarDec { id, .. }
            | Node::ClassDec { id, .. }
            | Node::Param { id, .. }
            | Node::Field { id, .. }
            | Node::Id(id)
            | Node::Call { id, .. } => Some(id),
            Node::FunDec(decl) | Node::MethodDec(decl) => Some(&decl.id),
            Node::DotCall { method, .. } => Some(method),
            Node::New { class, .. } => Some(class),
            _ => None,
        }
    }
}
