//! The compilation unit: a parsed tree plus the side tables filled in by the
//! passes.
//!
//! The tree itself is never modified after parsing. Each pass records its
//! results in maps keyed by [`NodeId`] and advances the unit's [`Stage`]; a
//! pass refuses to run on a unit at any other stage than the one it expects,
//! so enrichment happens exactly once.

use std::fmt;

use fool_core::{CompilationError, Word};
use fool_parser::ast::{NodeId, Tree, Type};
use rustc_hash::FxHashMap;

// ============================================================================
// Stage
// ============================================================================

/// How far a unit has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Fresh from the parser.
    Parsed,
    /// Declarations and uses are bound to symbol-table entries.
    Resolved,
    /// Expression types are recorded.
    Checked,
    /// Code has been generated.
    Generated,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Parsed => "parsed",
            Stage::Resolved => "resolved",
            Stage::Checked => "checked",
            Stage::Generated => "generated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Symbol-table entries
// ============================================================================

/// Index of a [`SymbolEntry`] in its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

/// What the symbol table knows about one declared name.
///
/// `offset` is relative to the frame pointer of the declaring scope, except
/// for methods, where it indexes the class dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub ty: Type,
    pub nesting_level: u32,
    pub offset: Word,
}

impl SymbolEntry {
    pub fn new(ty: Type, nesting_level: u32, offset: Word) -> Self {
        Self {
            ty,
            nesting_level,
            offset,
        }
    }

    /// Entry used in place of an unresolvable name so that later passes can
    /// keep going. Its type is incomplete.
    pub fn placeholder(nesting_level: u32) -> Self {
        Self::new(Type::Unresolved, nesting_level, 0)
    }
}

/// A resolved use of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    pub entry: EntryId,
    /// Nesting level of the scope the use appears in.
    pub nesting_level: u32,
}

// ============================================================================
// SideTables
// ============================================================================

/// Results attached to tree nodes by the passes.
#[derive(Debug, Default)]
pub struct SideTables {
    entries: Vec<SymbolEntry>,
    /// Declaration node -> its own entry.
    declarations: FxHashMap<NodeId, EntryId>,
    /// `Id`, `Call`, `New` and the object of a `DotCall` -> declaring entry.
    uses: FxHashMap<NodeId, Use>,
    /// `DotCall` -> method entry.
    method_uses: FxHashMap<NodeId, EntryId>,
    /// Expression node -> computed type.
    types: FxHashMap<NodeId, Type>,
}

impl SideTables {
    pub(crate) fn add_entry(&mut self, entry: SymbolEntry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Look up an entry. Entries are never removed, so ids handed out by
    /// these tables stay valid.
    pub fn entry(&self, id: EntryId) -> Option<&SymbolEntry> {
        self.entries.get(id.0 as usize)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn bind_declaration(&mut self, node: NodeId, entry: EntryId) {
        self.declarations.insert(node, entry);
    }

    pub(crate) fn bind_use(&mut self, node: NodeId, entry: EntryId, nesting_level: u32) {
        self.uses.insert(
            node,
            Use {
                entry,
                nesting_level,
            },
        );
    }

    pub(crate) fn bind_method(&mut self, node: NodeId, entry: EntryId) {
        self.method_uses.insert(node, entry);
    }

    /// The entry created for a declaration node.
    pub fn declaration(&self, node: NodeId) -> Option<&SymbolEntry> {
        self.declarations
            .get(&node)
            .and_then(|&entry| self.entry(entry))
    }

    /// The resolved use recorded for an identifier-using node.
    pub fn use_of(&self, node: NodeId) -> Option<Use> {
        self.uses.get(&node).copied()
    }

    /// The declaring entry of an identifier-using node.
    pub fn use_entry(&self, node: NodeId) -> Option<&SymbolEntry> {
        self.use_of(node).and_then(|u| self.entry(u.entry))
    }

    /// Number of static links to follow from a use to its declaring frame.
    pub fn hops(&self, node: NodeId) -> Option<u32> {
        let resolved = self.use_of(node)?;
        let entry = self.entry(resolved.entry)?;
        resolved.nesting_level.checked_sub(entry.nesting_level)
    }

    /// The method entry of a `DotCall`.
    pub fn method_entry(&self, node: NodeId) -> Option<&SymbolEntry> {
        self.method_uses
            .get(&node)
            .and_then(|&entry| self.entry(entry))
    }

    pub(crate) fn set_type(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    /// The type computed for an expression node by the type checker.
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }
}

// ============================================================================
// CompilationUnit
// ============================================================================

/// A tree together with everything the passes have attached to it.
#[derive(Debug)]
pub struct CompilationUnit {
    tree: Tree,
    stage: Stage,
    tables: SideTables,
}

impl CompilationUnit {
    /// Wrap a freshly parsed tree.
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            stage: Stage::Parsed,
            tables: SideTables::default(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tables(&self) -> &SideTables {
        &self.tables
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Borrow the tree and the side tables separately, so a pass can read
    /// one while filling in the other.
    pub(crate) fn parts_mut(&mut self) -> (&Tree, &mut SideTables) {
        (&self.tree, &mut self.tables)
    }

    /// Fail with [`CompilationError::PassOrder`] unless the unit is at `expected`.
    pub(crate) fn require_stage(
        &self,
        pass: &'static str,
        expected: Stage,
    ) -> Result<(), CompilationError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(CompilationError::PassOrder {
                pass,
                expected: expected.name(),
                found: self.stage.name(),
            })
        }
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage);
        self.stage = stage;
    }
}
