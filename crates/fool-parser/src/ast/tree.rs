//! Arena storage for syntax trees.

use fool_core::Span;

use super::node::{Node, NodeId};

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    node: Node,
    span: Span,
}

/// A parsed program.
///
/// Nodes are allocated once, children before parents, and never changed
/// afterwards. The root is the last node allocated by the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    slots: Vec<Slot>,
    root: Option<NodeId>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn alloc(&mut self, node: Node, span: Span) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot { node, span });
        id
    }

    /// Mark a node as the program root.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// The program node (`Prog` or `LetInProg`).
    ///
    /// Trees produced by the parser always have one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.index()].node
    }

    /// Look up a node, returning `None` for foreign ids.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).map(|slot| &slot.node)
    }

    /// Source span of a node.
    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.slots
            .get(id.index())
            .map(|slot| slot.span)
            .unwrap_or_default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (NodeId(i as u32), &slot.node))
    }
}
