//! Indented tree printer.
//!
//! Later passes can attach text to nodes (resolved entries, computed types)
//! through [`NodeAnnotations`].

use std::fmt;

use super::node::{Node, NodeId};
use super::tree::Tree;

/// Extra text shown next to a node in a [`TreeDump`].
pub trait NodeAnnotations {
    fn annotate(&self, id: NodeId) -> Option<String>;
}

/// No annotations: prints the bare tree.
impl NodeAnnotations for () {
    fn annotate(&self, _id: NodeId) -> Option<String> {
        None
    }
}

/// Displays a tree one node per line, children indented below parents.
pub struct TreeDump<'a, A: NodeAnnotations = ()> {
    tree: &'a Tree,
    annotations: &'a A,
}

impl<'a> TreeDump<'a, ()> {
    pub fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            annotations: &(),
        }
    }
}

impl<'a, A: NodeAnnotations> TreeDump<'a, A> {
    pub fn with_annotations(tree: &'a Tree, annotations: &'a A) -> Self {
        Self { tree, annotations }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.tree.node(id);
        write!(f, "{:indent$}{}", "", node.kind_name(), indent = depth * 2)?;
        match node {
            Node::Int(value) => write!(f, ": {value}")?,
            Node::Bool(value) => write!(f, ": {value}")?,
            Node::DotCall { object, method, .. } => write!(f, ": {}.{}", object.name, method.name)?,
            other => {
                if let Some(id) = other.name() {
                    write!(f, ": {}", id.name)?;
                }
            }
        }
        if let Some(note) = self.annotations.annotate(id) {
            write!(f, "  [{note}]")?;
        }
        writeln!(f)?;

        for child in node.children() {
            self.write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl<A: NodeAnnotations> fmt::Display for TreeDump<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.root() {
            Some(root) => self.write_node(f, root, 0),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn dumps_nested_nodes() {
        let tree = Parser::parse("let var x:int = 1 + 2; in print(x);").unwrap();
        let text = TreeDump::new(&tree).to_string();
        assert_eq!(
            text,
            "LetInProg\n  VarDec: x\n    Plus\n      Int: 1\n      Int: 2\n  Print\n    Id: x\n"
        );
    }

    struct Numbered;

    impl NodeAnnotations for Numbered {
        fn annotate(&self, id: NodeId) -> Option<String> {
            Some(format!("{id:?}"))
        }
    }

    #[test]
    fn shows_annotations() {
        let tree = Parser::parse("true;").unwrap();
        let text = TreeDump::with_annotations(&tree, &Numbered).to_string();
        assert_eq!(text, "Prog  [#1]\n  Bool: true  [#0]\n");
    }
}
