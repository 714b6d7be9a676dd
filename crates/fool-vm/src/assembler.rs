//! Assembler: [`AsmProgram`] to flat code memory.
//!
//! Every instruction takes one code word for its opcode, plus one for the
//! operand of `push`, `b`, `beq` and `bleq`. Labels take no space; a label
//! resolves to the address of the next instruction. A label used as an
//! operand is replaced by that address, so `push function0` pushes the
//! entry point of `function0`.
//!
//! Resolution takes two passes over the lines: the first assigns addresses
//! and records label definitions, the second encodes.

use fool_core::{AsmLine, AsmProgram, AssemblyError, OpCode, Operand, Word};
use rustc_hash::FxHashMap;

/// Assembled code ready for the [`Machine`](crate::Machine).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    code: Vec<Word>,
    labels: FxHashMap<String, Word>,
}

impl Program {
    /// Wrap raw code words that carry no label table.
    pub fn from_code(code: Vec<Word>) -> Self {
        Self {
            code,
            labels: FxHashMap::default(),
        }
    }

    /// Code memory: opcode and operand words.
    pub fn code(&self) -> &[Word] {
        &self.code
    }

    /// Number of code words.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The address a label resolved to.
    pub fn label(&self, name: &str) -> Option<Word> {
        self.labels.get(name).copied()
    }
}

/// Assemble a parsed program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn assemble(program: &AsmProgram) -> Result<Program, AssemblyError> {
    let labels = resolve_labels(program)?;

    let mut code = Vec::new();
    for (index, line) in program.lines().iter().enumerate() {
        let AsmLine::Instr { op, operand } = line else {
            continue;
        };
        code.push(op.to_word());
        match operand {
            None => {}
            Some(Operand::Int(value)) => code.push(*value),
            Some(Operand::Label(name)) => {
                let address = labels
                    .get(name)
                    .copied()
                    .ok_or_else(|| AssemblyError::UndefinedLabel {
                        line: index + 1,
                        label: name.clone(),
                    })?;
                code.push(address);
            }
        }
    }

    Ok(Program { code, labels })
}

/// Parse assembly text and assemble it.
pub fn assemble_text(text: &str) -> Result<Program, AssemblyError> {
    assemble(&AsmProgram::parse(text)?)
}

fn resolve_labels(program: &AsmProgram) -> Result<FxHashMap<String, Word>, AssemblyError> {
    let mut labels = FxHashMap::default();
    let mut words = 0usize;

    for (index, line) in program.lines().iter().enumerate() {
        match line {
            AsmLine::Label(name) => {
                let address = Word::try_from(words)
                    .map_err(|_| AssemblyError::ProgramTooLarge { words })?;
                if labels.insert(name.clone(), address).is_some() {
                    return Err(AssemblyError::DuplicateLabel {
                        line: index + 1,
                        label: name.clone(),
                    });
                }
            }
            AsmLine::Instr { op, .. } => {
                words += instruction_width(*op);
            }
        }
    }

    if Word::try_from(words).is_err() {
        return Err(AssemblyError::ProgramTooLarge { words });
    }
    Ok(labels)
}

fn instruction_width(op: OpCode) -> usize {
    if op.has_operand() { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_opcodes_and_operands() {
        let program = assemble_text("push 7\npush -2\nadd\nhalt").unwrap();
        assert_eq!(
            program.code(),
            &[
                OpCode::Push.to_word(),
                7,
                OpCode::Push.to_word(),
                -2,
                OpCode::Add.to_word(),
                OpCode::Halt.to_word(),
            ]
        );
    }

    #[test]
    fn labels_resolve_to_the_next_instruction() {
        let program = assemble_text("b end\nstart:\npush start\nend:\nhalt").unwrap();
        assert_eq!(program.label("start"), Some(2));
        assert_eq!(program.label("end"), Some(4));
        assert_eq!(program.code()[1], 4);
        assert_eq!(program.code()[3], 2);
        assert_eq!(program.len(), 5);
    }

    #[test]
    fn forward_and_trailing_labels() {
        let program = assemble_text("push tail\nhalt\ntail:").unwrap();
        assert_eq!(program.label("tail"), Some(3));
        assert_eq!(program.code()[1], 3);
    }

    #[test]
    fn undefined_label_reports_its_line() {
        assert_eq!(
            assemble_text("push 1\nbeq nowhere"),
            Err(AssemblyError::UndefinedLabel {
                line: 2,
                label: "nowhere".into()
            })
        );
    }

    #[test]
    fn duplicate_label() {
        assert_eq!(
            assemble_text("a:\nhalt\na:\nhalt"),
            Err(AssemblyError::DuplicateLabel {
                line: 3,
                label: "a".into()
            })
        );
    }

    #[test]
    fn empty_program() {
        let program = assemble(&AsmProgram::new()).unwrap();
        assert!(program.is_empty());
    }
}
