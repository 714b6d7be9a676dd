//! Enriched tree printing.
//!
//! Shows, next to each node, what the passes attached to it:
//!
//! ```text
//! LetInProg
//!   VarDec: x  [nl 0 offset -2 : int]
//!     Int: 5  [: int]
//!   Print  [: int]
//!     Id: x  [-> nl 0 offset -2, hops 0 : int]
//! ```

use fool_parser::ast::{NodeAnnotations, NodeId, TreeDump};

use crate::unit::{CompilationUnit, SideTables};

impl NodeAnnotations for SideTables {
    fn annotate(&self, id: NodeId) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(entry) = self.declaration(id) {
            parts.push(format!(
                "nl {} offset {} : {}",
                entry.nesting_level, entry.offset, entry.ty
            ));
        }
        if let Some(entry) = self.use_entry(id) {
            let hops = self.hops(id).unwrap_or_default();
            parts.push(format!(
                "-> nl {} offset {}, hops {}",
                entry.nesting_level, entry.offset, hops
            ));
        }
        if let Some(method) = self.method_entry(id) {
            parts.push(format!("method {}", method.offset));
        }

        let mut note = parts.join(", ");
        if let Some(ty) = self.type_of(id) {
            if !note.is_empty() {
                note.push(' ');
            }
            note.push_str(&format!(": {ty}"));
        }
        (!note.is_empty()).then_some(note)
    }
}

/// Render the unit's tree with everything the passes recorded so far.
pub fn dump(unit: &CompilationUnit) -> String {
    TreeDump::with_annotations(unit.tree(), unit.tables()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{SymbolTablePass, TypeCheckPass};
    use fool_parser::Parser;

    #[test]
    fn shows_entries_and_types() {
        let mut unit =
            CompilationUnit::new(Parser::parse("let var x:int = 5; in print(x);").unwrap());
        SymbolTablePass::new(&mut unit).run();
        TypeCheckPass::new(&mut unit).run();

        assert_eq!(
            dump(&unit),
            "LetInProg\n\
             \x20 VarDec: x  [nl 0 offset -2 : int]\n\
             \x20   Int: 5  [: int]\n\
             \x20 Print  [: int]\n\
             \x20   Id: x  [-> nl 0 offset -2, hops 0 : int]\n"
        );
    }

    #[test]
    fn bare_tree_before_any_pass() {
        let unit = CompilationUnit::new(Parser::parse("1;").unwrap());
        assert_eq!(dump(&unit), "Prog\n  Int: 1\n");
    }
}
