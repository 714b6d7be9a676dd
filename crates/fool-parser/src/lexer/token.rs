//! Token types and definitions for the FOOL lexer.

use fool_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The lexeme borrows the source text; the tree copies out whatever it keeps.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token.
    pub lexeme: &'src str,
    /// Location in source.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of FOOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals and names
    // =========================================
    /// Integer literal: `0`, `42`
    Num,
    /// Identifier: `x`, `Account`
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    True,
    False,
    Null,
    If,
    Then,
    Else,
    Print,
    Let,
    In,
    Var,
    Fun,
    Class,
    New,
    Int,
    Bool,

    // =========================================
    // Operators
    // =========================================
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `||`
    OrOr,
    /// `&&`
    AndAnd,
    /// `!`
    Bang,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `==`
    EqualEqual,
    /// `=`
    Assign,

    // =========================================
    // Delimiters
    // =========================================
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,

    // =========================================
    // Special
    // =========================================
    /// End of input.
    Eof,
    /// A lexical error; the error itself is recorded by the lexer.
    Error,
}

impl TokenKind {
    /// Whether this token is a reserved word.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            True | False
                | Null
                | If
                | Then
                | Else
                | Print
                | Let
                | In
                | Var
                | Fun
                | Class
                | New
                | Int
                | Bool
        )
    }

    /// Get the string representation of this token kind for error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            Num => "number",
            Identifier => "identifier",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            If => "'if'",
            Then => "'then'",
            Else => "'else'",
            Print => "'print'",
            Let => "'let'",
            In => "'in'",
            Var => "'var'",
            Fun => "'fun'",
            Class => "'class'",
            New => "'new'",
            Int => "'int'",
            Bool => "'bool'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            OrOr => "'||'",
            AndAnd => "'&&'",
            Bang => "'!'",
            GreaterEqual => "'>='",
            LessEqual => "'<='",
            EqualEqual => "'=='",
            Assign => "'='",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Colon => "':'",
            Comma => "','",
            Dot => "'.'",
            Eof => "end of file",
            Error => "error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword string to its [`TokenKind`], or `None` if not a keyword.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "true" => True,
        "false" => False,
        "null" => Null,
        "if" => If,
        "then" => Then,
        "else" => Else,
        "print" => Print,
        "let" => Let,
        "in" => In,
        "var" => Var,
        "fun" => Fun,
        "class" => Class,
        "new" => New,
        "int" => Int,
        "bool" => Bool,
        _ => return None,
    })
}
