//! Error types for every phase of the FOOL toolchain.
//!
//! ## Error Hierarchy
//!
//! ```text
//! FoolError (top-level wrapper)
//! ├── ParseErrors        - lexing and parsing (one or more ParseError)
//! ├── CompilationErrors  - symbol table and type checking diagnostics
//! ├── AssemblyError      - malformed assembly text / unresolved labels
//! └── RuntimeError       - fatal faults raised by the virtual machine
//! ```
//!
//! Compile-time errors are collected so that one run can report several of
//! them. Runtime errors are always fatal and carry the instruction pointer of
//! the faulting instruction.

use thiserror::Error;

use crate::Span;
use crate::bytecode::Word;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur while splitting source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character that cannot start any token.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A `/* ... */` comment without its closing delimiter.
    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    /// A numeric literal outside the 32-bit word range.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A lexical error surfaced through the parser.
    Lexical,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type (`int`, `bool` or a class name) was expected.
    ExpectedType,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A `var`, `fun` or `class` declaration was expected.
    ExpectedDeclaration,
    /// A class declaration appeared after a `var`/`fun` declaration.
    MisplacedClass,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::MisplacedClass => "misplaced class declaration",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A syntax error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            "unexpected end of file".to_string(),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!(
            "Error at {}:{}: {}\n",
            self.span.line, self.span.col, self.kind
        );
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        let line_text = (self.span.line as usize)
            .checked_sub(1)
            .and_then(|index| source.lines().nth(index));
        if let Some(line_text) = line_text {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {indent}{pointer}\n"));
        }

        output
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, error.span(), error.to_string())
    }
}

/// A collection of syntax errors from one parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Diagnostics produced by the symbol table builder, the type checker and
/// the code generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// A name was used that no open scope declares.
    #[error("at {span}: undeclared identifier '{name}'")]
    UndeclaredIdentifier { name: String, span: Span },

    /// A name was declared twice in the same scope.
    #[error("at {span}: '{name}' is already declared in this scope")]
    DuplicateDeclaration { name: String, span: Span },

    /// A type or `new` named a class that does not exist.
    #[error("at {span}: unknown class '{name}'")]
    UnknownClass { name: String, span: Span },

    /// A method was invoked on an identifier that is not an object.
    #[error("at {span}: '{name}' is not an object")]
    NotAnObject { name: String, span: Span },

    /// A method name that the receiver's class does not declare.
    #[error("at {span}: class '{class}' has no method '{method}'")]
    UnknownMethod {
        class: String,
        method: String,
        span: Span,
    },

    /// Wrong operand, argument, initializer or return type, or wrong arity.
    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// A pass was run on a unit that is not at the stage it requires.
    #[error("{pass} requires a {expected} unit, found a {found} unit")]
    PassOrder {
        pass: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Internal compiler error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Convenience constructor for [`CompilationError::TypeMismatch`].
    pub fn mismatch(message: impl Into<String>, span: Span) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// Convenience constructor for [`CompilationError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal {
            message: message.into(),
        }
    }

    /// The source location of the error, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompilationError::UndeclaredIdentifier { span, .. }
            | CompilationError::DuplicateDeclaration { span, .. }
            | CompilationError::UnknownClass { span, .. }
            | CompilationError::NotAnObject { span, .. }
            | CompilationError::UnknownMethod { span, .. }
            | CompilationError::TypeMismatch { span, .. } => Some(*span),
            CompilationError::PassOrder { .. } | CompilationError::Internal { .. } => None,
        }
    }
}

/// All diagnostics reported by one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationErrors {
    errors: Vec<CompilationError>,
}

impl CompilationErrors {
    /// Wrap a list of diagnostics.
    pub fn new(errors: Vec<CompilationError>) -> Self {
        Self { errors }
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &CompilationError> {
        self.errors.iter()
    }

    /// Borrow the errors as a slice.
    pub fn as_slice(&self) -> &[CompilationError] {
        &self.errors
    }
}

impl From<CompilationError> for CompilationErrors {
    fn from(error: CompilationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for CompilationErrors {
    type Item = CompilationError;
    type IntoIter = std::vec::IntoIter<CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl std::fmt::Display for CompilationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilationErrors {}

// ============================================================================
// Assembly Errors
// ============================================================================

/// Errors raised while reading or assembling instruction text.
///
/// Line numbers are 1-based positions in the assembly text (or in the
/// generated line list).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// A mnemonic that is not part of the instruction set.
    #[error("line {line}: unknown opcode '{name}'")]
    UnknownOpcode { line: usize, name: String },

    /// An instruction that needs an operand was written without one.
    #[error("line {line}: '{opcode}' requires an operand")]
    MissingOperand { line: usize, opcode: &'static str },

    /// An operand was given to an instruction that takes none.
    #[error("line {line}: '{opcode}' takes no operand")]
    UnexpectedOperand { line: usize, opcode: &'static str },

    /// An operand that is neither a word nor a label name.
    #[error("line {line}: invalid operand '{operand}'")]
    InvalidOperand { line: usize, operand: String },

    /// A jump or push referenced a label that is never defined.
    #[error("line {line}: undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },

    /// The same label was defined twice.
    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { line: usize, label: String },

    /// The code does not fit the word-sized address space.
    #[error("program has {words} code words, more than an address can hold")]
    ProgramTooLarge { words: usize },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Fatal faults raised by the virtual machine. Execution stops immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An instruction needed more operands than the stack holds.
    #[error("stack underflow at instruction {ip}")]
    StackUnderflow { ip: usize },

    /// `lw`/`sw` addressed a cell outside both the stack and the heap.
    #[error("address {address} out of range at instruction {ip}")]
    AddressOutOfRange { address: Word, ip: usize },

    /// `lw` read a heap cell that was never written.
    #[error("read of uninitialized heap cell {address} at instruction {ip}")]
    UninitializedRead { address: Word, ip: usize },

    /// The heap and the stack met: the address budget is exhausted.
    #[error("out of memory at instruction {ip}: heap and stack collided")]
    MemoryExhausted { ip: usize },

    /// `div` with a zero divisor.
    #[error("division by zero at instruction {ip}")]
    DivisionByZero { ip: usize },

    /// The code word at the instruction pointer is not an opcode.
    #[error("invalid opcode {word} at instruction {ip}")]
    InvalidOpcode { word: Word, ip: usize },

    /// Control reached an address outside the code memory.
    #[error("jump to {target} outside the code at instruction {ip}")]
    InvalidJump { target: Word, ip: usize },

    /// Execution ran off the end of the code without `halt`.
    #[error("execution ran past the end of the code")]
    MissingHalt,

    /// The configured step budget ran out.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },

    /// `print` output could not be written.
    #[error("failed to write output: {message}")]
    Output { message: String },
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error the FOOL pipeline can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FoolError {
    /// Syntax errors.
    #[error("{0}")]
    Parse(#[from] ParseErrors),

    /// Declaration, scoping and type errors.
    #[error("{0}")]
    Compilation(#[from] CompilationErrors),

    /// Malformed assembly text.
    #[error("{0}")]
    Assembly(#[from] AssemblyError),

    /// Virtual machine fault.
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
