//! Lexical scopes for the symbol table builder.
//!
//! Each `let` body, function or method body, and class body opens a
//! [`Scope`]. The position of a scope in the [`ScopeStack`] is its nesting
//! level. Lookups walk from the innermost scope outwards.

use fool_core::Word;
use rustc_hash::FxHashMap;

use crate::unit::EntryId;

// ============================================================================
// Scope
// ============================================================================

/// Names declared in one lexical scope.
#[derive(Debug)]
pub struct Scope {
    names: FxHashMap<String, EntryId>,
    /// Offset handed to the next local declaration. Locals grow downwards.
    next_offset: Word,
}

impl Scope {
    /// Create a scope whose first local declaration gets `first_offset`.
    pub fn new(first_offset: Word) -> Self {
        Self {
            names: FxHashMap::default(),
            next_offset: first_offset,
        }
    }

    /// Take the next local offset. Offsets are never reused, not even when
    /// the declaration turns out to be a duplicate.
    pub fn allocate_offset(&mut self) -> Word {
        let offset = self.next_offset;
        self.next_offset -= 1;
        offset
    }

    /// Bind a name. Returns `false` if the name is already bound here.
    pub fn declare(&mut self, name: &str, entry: EntryId) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.to_string(), entry);
        true
    }

    pub fn get(&self, name: &str) -> Option<EntryId> {
        self.names.get(name).copied()
    }
}

// ============================================================================
// ScopeStack
// ============================================================================

/// The chain of open scopes.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope one level deeper.
    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Close the innermost scope.
    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// Nesting level of the innermost scope (0 = outermost).
    pub fn level(&self) -> u32 {
        self.scopes.len().saturating_sub(1) as u32
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// Find the innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{SideTables, SymbolEntry};
    use fool_parser::Type;

    fn entries(n: usize) -> Vec<EntryId> {
        let mut tables = SideTables::default();
        (0..n)
            .map(|i| tables.add_entry(SymbolEntry::new(Type::Int, 0, i as Word)))
            .collect()
    }

    #[test]
    fn offsets_count_down_and_are_not_reused() {
        let mut scope = Scope::new(-2);
        assert_eq!(scope.allocate_offset(), -2);
        assert_eq!(scope.allocate_offset(), -3);
        assert_eq!(scope.allocate_offset(), -4);
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let ids = entries(2);
        let mut scope = Scope::new(-2);
        assert!(scope.declare("x", ids[0]));
        assert!(!scope.declare("x", ids[1]));
        assert_eq!(scope.get("x"), Some(ids[0]));
    }

    #[test]
    fn lookup_walks_outwards_and_inner_shadows() {
        let ids = entries(3);
        let mut stack = ScopeStack::new();
        stack.push(Scope::new(-2));
        stack.current_mut().unwrap().declare("x", ids[0]);
        stack.current_mut().unwrap().declare("y", ids[1]);
        stack.push(Scope::new(-2));
        stack.current_mut().unwrap().declare("x", ids[2]);

        assert_eq!(stack.level(), 1);
        assert_eq!(stack.lookup("x"), Some(ids[2]));
        assert_eq!(stack.lookup("y"), Some(ids[1]));
        assert_eq!(stack.lookup("z"), None);

        stack.pop();
        assert_eq!(stack.level(), 0);
        assert_eq!(stack.lookup("x"), Some(ids[0]));
    }
}
