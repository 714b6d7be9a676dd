//! Operator definitions for FOOL expressions.
//!
//! Provides the binary operator enum along with the precedence information
//! used by the Pratt parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Logical (precedence 1)
    /// `||`
    Or,
    /// `&&`
    And,

    // Comparison (precedence 2)
    /// `==`
    Equal,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,

    // Additive (precedence 3)
    /// `+`
    Plus,
    /// `-`
    Minus,

    // Multiplicative (precedence 4)
    /// `*`
    Times,
    /// `/`
    Div,
}

impl BinaryOp {
    /// Get the binding power (precedence) for this operator.
    ///
    /// Higher values bind more tightly. Returns (left_bp, right_bp); every
    /// FOOL operator is left-associative, so right_bp = left_bp + 1.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Or | And => (3, 4),
            Equal | LessEqual | GreaterEqual => (5, 6),
            Plus | Minus => (7, 8),
            Times | Div => (9, 10),
        }
    }

    /// Binding power for the operand of `!`. Lower than every binary operator,
    /// so `!a && b` negates the whole conjunction.
    pub const NOT_OPERAND_BP: u8 = 0;

    /// Try to convert a token kind to a binary operator.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            OrOr => BinaryOp::Or,
            AndAnd => BinaryOp::And,
            EqualEqual => BinaryOp::Equal,
            LessEqual => BinaryOp::LessEqual,
            GreaterEqual => BinaryOp::GreaterEqual,
            Plus => BinaryOp::Plus,
            Minus => BinaryOp::Minus,
            Star => BinaryOp::Times,
            Slash => BinaryOp::Div,
            _ => return None,
        })
    }

    /// Node name used by the tree printer.
    pub fn node_name(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Or => "Or",
            And => "And",
            Equal => "Equal",
            LessEqual => "LessEqual",
            GreaterEqual => "GreaterEqual",
            Plus => "Plus",
            Minus => "Minus",
            Times => "Times",
            Div => "Div",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            Or => "||",
            And => "&&",
            Equal => "==",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Div => "/",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinaryOp::Times.binding_power().0 > BinaryOp::Plus.binding_power().0);
        assert!(BinaryOp::Plus.binding_power().0 > BinaryOp::Equal.binding_power().0);
        assert!(BinaryOp::Equal.binding_power().0 > BinaryOp::And.binding_power().0);
        assert_eq!(BinaryOp::Or.binding_power(), BinaryOp::And.binding_power());
    }

    #[test]
    fn from_token() {
        assert_eq!(BinaryOp::from_token(TokenKind::Star), Some(BinaryOp::Times));
        assert_eq!(BinaryOp::from_token(TokenKind::OrOr), Some(BinaryOp::Or));
        assert_eq!(BinaryOp::from_token(TokenKind::Bang), None);
    }
}
