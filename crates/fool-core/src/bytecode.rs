//! The stack-machine instruction set and its textual form.
//!
//! The code generator produces an [`AsmProgram`]: an ordered list of
//! [`AsmLine`]s, each a label definition or an instruction with an optional
//! operand. The program prints as newline-joined text (`label:` or
//! `opcode[ operand]`) and parses back from the same text, which makes the
//! text a stable boundary between compiler and machine.

use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::AssemblyError;

/// A machine word. Values, addresses and code cells are all words.
pub type Word = i32;

/// Default size of the machine address space, in words.
///
/// The global frame pointer starts here, so the generated code for `new`
/// addresses the class slots of the global frame relative to this value.
pub const MEMSIZE: Word = 10_000;

/// Operation codes of the stack machine.
///
/// In code memory an opcode occupies one word; `push`, `b`, `beq` and `bleq`
/// are followed by one operand word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Stack
    // =========================================================================
    /// Push the operand.
    Push = 0,
    /// Discard the top of the stack.
    Pop,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// Pop two, push `second + top`.
    Add,
    /// Pop two, push `second - top`.
    Sub,
    /// Pop two, push `second * top`.
    Mult,
    /// Pop two, push `second / top`.
    Div,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Jump to the operand address.
    Branch,
    /// Pop two, jump if they are equal.
    BranchEq,
    /// Pop two, jump if `second <= top`.
    BranchLessEq,
    /// Pop an address, jump there after saving the next address in `ra`.
    JumpSub,

    // =========================================================================
    // Memory
    // =========================================================================
    /// Pop an address, push the word stored there.
    LoadWord,
    /// Pop an address, then a value, and store the value at the address.
    StoreWord,

    // =========================================================================
    // Registers
    // =========================================================================
    /// Push the frame pointer.
    LoadFp,
    /// Pop into the frame pointer.
    StoreFp,
    /// Set the frame pointer to the stack pointer.
    CopyFp,
    /// Push the return address.
    LoadRa,
    /// Pop into the return address.
    StoreRa,
    /// Push the heap pointer.
    LoadHp,
    /// Pop into the heap pointer.
    StoreHp,
    /// Pop into the temporary register.
    StoreTm,
    /// Push the temporary register.
    LoadTm,

    // =========================================================================
    // Misc
    // =========================================================================
    /// Emit the top of the stack without removing it.
    Print,
    /// Stop execution.
    Halt,
}

impl OpCode {
    /// All opcodes, in encoding order.
    pub const ALL: [OpCode; 23] = [
        OpCode::Push,
        OpCode::Pop,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mult,
        OpCode::Div,
        OpCode::Branch,
        OpCode::BranchEq,
        OpCode::BranchLessEq,
        OpCode::JumpSub,
        OpCode::LoadWord,
        OpCode::StoreWord,
        OpCode::LoadFp,
        OpCode::StoreFp,
        OpCode::CopyFp,
        OpCode::LoadRa,
        OpCode::StoreRa,
        OpCode::LoadHp,
        OpCode::StoreHp,
        OpCode::StoreTm,
        OpCode::LoadTm,
        OpCode::Print,
        OpCode::Halt,
    ];

    /// The assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Push => "push",
            OpCode::Pop => "pop",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mult => "mult",
            OpCode::Div => "div",
            OpCode::Branch => "b",
            OpCode::BranchEq => "beq",
            OpCode::BranchLessEq => "bleq",
            OpCode::JumpSub => "js",
            OpCode::LoadWord => "lw",
            OpCode::StoreWord => "sw",
            OpCode::LoadFp => "lfp",
            OpCode::StoreFp => "sfp",
            OpCode::CopyFp => "cfp",
            OpCode::LoadRa => "lra",
            OpCode::StoreRa => "sra",
            OpCode::LoadHp => "lhp",
            OpCode::StoreHp => "shp",
            OpCode::StoreTm => "stm",
            OpCode::LoadTm => "ltm",
            OpCode::Print => "print",
            OpCode::Halt => "halt",
        }
    }

    /// Look up an opcode by its mnemonic.
    pub fn from_mnemonic(name: &str) -> Option<OpCode> {
        Self::ALL.iter().copied().find(|op| op.mnemonic() == name)
    }

    /// Whether this instruction is followed by an operand word.
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            OpCode::Push | OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        )
    }

    /// Decode a code-memory word.
    pub fn from_word(word: Word) -> Option<OpCode> {
        u8::try_from(word)
            .ok()
            .and_then(|byte| OpCode::try_from(byte).ok())
    }

    /// Encode as a code-memory word.
    pub fn to_word(self) -> Word {
        Word::from(u8::from(self))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An instruction operand: a literal word or a symbolic label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Int(Word),
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{value}"),
            Operand::Label(name) => f.write_str(name),
        }
    }
}

/// One line of assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsmLine {
    /// `name:`
    Label(String),
    /// `opcode` or `opcode operand`
    Instr { op: OpCode, operand: Option<Operand> },
}

impl AsmLine {
    /// An instruction without operand.
    pub fn op(op: OpCode) -> Self {
        AsmLine::Instr { op, operand: None }
    }

    /// `push value`
    pub fn push(value: Word) -> Self {
        AsmLine::Instr {
            op: OpCode::Push,
            operand: Some(Operand::Int(value)),
        }
    }

    /// An instruction whose operand is a label.
    pub fn with_label(op: OpCode, label: impl Into<String>) -> Self {
        AsmLine::Instr {
            op,
            operand: Some(Operand::Label(label.into())),
        }
    }

    /// Parse a single non-empty line. `line_no` is used for errors only.
    pub fn parse(text: &str, line_no: usize) -> Result<AsmLine, AssemblyError> {
        let text = text.trim();
        if let Some(name) = text.strip_suffix(':') {
            if !is_label_name(name) {
                return Err(AssemblyError::InvalidOperand {
                    line: line_no,
                    operand: name.to_string(),
                });
            }
            return Ok(AsmLine::Label(name.to_string()));
        }

        let mut parts = text.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let op = OpCode::from_mnemonic(name).ok_or_else(|| AssemblyError::UnknownOpcode {
            line: line_no,
            name: name.to_string(),
        })?;
        let operand = parts.next();
        if let Some(extra) = parts.next() {
            return Err(AssemblyError::InvalidOperand {
                line: line_no,
                operand: extra.to_string(),
            });
        }

        match (op.has_operand(), operand) {
            (false, None) => Ok(AsmLine::op(op)),
            (false, Some(_)) => Err(AssemblyError::UnexpectedOperand {
                line: line_no,
                opcode: op.mnemonic(),
            }),
            (true, None) => Err(AssemblyError::MissingOperand {
                line: line_no,
                opcode: op.mnemonic(),
            }),
            (true, Some(raw)) => {
                let operand = parse_operand(raw).ok_or_else(|| AssemblyError::InvalidOperand {
                    line: line_no,
                    operand: raw.to_string(),
                })?;
                Ok(AsmLine::Instr {
                    op,
                    operand: Some(operand),
                })
            }
        }
    }
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmLine::Label(name) => write!(f, "{name}:"),
            AsmLine::Instr { op, operand: None } => write!(f, "{op}"),
            AsmLine::Instr {
                op,
                operand: Some(operand),
            } => write!(f, "{op} {operand}"),
        }
    }
}

fn parse_operand(raw: &str) -> Option<Operand> {
    if is_label_name(raw) {
        Some(Operand::Label(raw.to_string()))
    } else {
        raw.parse::<Word>().ok().map(Operand::Int)
    }
}

fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A complete assembly program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsmProgram {
    lines: Vec<AsmLine>,
}

impl AsmProgram {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a program from its lines.
    pub fn from_lines(lines: Vec<AsmLine>) -> Self {
        Self { lines }
    }

    /// Append one line.
    pub fn push(&mut self, line: AsmLine) {
        self.lines.push(line);
    }

    /// The program lines in order.
    pub fn lines(&self) -> &[AsmLine] {
        &self.lines
    }

    /// Number of lines, labels included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the program has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of instructions, labels excluded.
    pub fn instruction_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, AsmLine::Instr { .. }))
            .count()
    }

    /// Parse newline-separated assembly text. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<AsmProgram, AssemblyError> {
        let mut lines = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            lines.push(AsmLine::parse(raw, index + 1)?);
        }
        Ok(AsmProgram { lines })
    }
}

impl FromStr for AsmProgram {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AsmProgram::parse(s)
    }
}

impl fmt::Display for AsmProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Extend<AsmLine> for AsmProgram {
    fn extend<T: IntoIterator<Item = AsmLine>>(&mut self, iter: T) {
        self.lines.extend(iter);
    }
}

impl IntoIterator for AsmProgram {
    type Item = AsmLine;
    type IntoIter = std::vec::IntoIter<AsmLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}
