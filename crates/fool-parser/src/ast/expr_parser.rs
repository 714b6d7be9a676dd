//! Expression parsing using Pratt parsing (precedence climbing).

use fool_core::{LexError, ParseError, Span, Word};

use super::node::{Node, NodeId};
use super::ops::BinaryOp;
use super::parser::{Parser, describe};
use crate::lexer::TokenKind;

impl<'src> Parser<'src> {
    /// Parse an expression with a minimum binding power.
    ///
    /// Only operators whose left binding power reaches `min_bp` are consumed.
    pub(super) fn parse_expr(&mut self, min_bp: u8) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_prefix()?;

        while let Some(op) = BinaryOp::from_token(self.peek().kind) {
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }

            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = self.tree.span(lhs).through(self.tree.span(rhs));
            lhs = self.tree.alloc(
                Node::Binary {
                    op,
                    left: lhs,
                    right: rhs,
                },
                span,
            );
        }

        Ok(lhs)
    }

    /// Parse a prefix expression (the start of an expression).
    fn parse_prefix(&mut self) -> Result<NodeId, ParseError> {
        let token = self.peek();

        match token.kind {
            TokenKind::Num => {
                self.advance();
                let value = parse_number(token.lexeme, token.span)?;
                Ok(self.tree.alloc(Node::Int(value), token.span))
            }

            TokenKind::Minus => {
                self.advance();
                let number = self.peek();
                if number.kind != TokenKind::Num {
                    return Err(ParseError::expected_token(
                        number.span,
                        "number",
                        &describe(&number),
                    ));
                }
                self.advance();
                let span = token.span.through(number.span);
                let value = parse_number(&format!("-{}", number.lexeme), span)?;
                Ok(self.tree.alloc(Node::Int(value), span))
            }

            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = token.kind == TokenKind::True;
                Ok(self.tree.alloc(Node::Bool(value), token.span))
            }

            TokenKind::Null => {
                self.advance();
                Ok(self.tree.alloc(Node::Null, token.span))
            }

            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_expr(BinaryOp::NOT_OPERAND_BP)?;
                let span = token.span.through(self.tree.span(operand));
                Ok(self.tree.alloc(Node::Not(operand), span))
            }

            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }

            TokenKind::If => self.parse_if(),

            TokenKind::Print => {
                self.advance();
                self.expect(TokenKind::LeftParen)?;
                let operand = self.parse_expr(0)?;
                let end = self.expect(TokenKind::RightParen)?.span;
                Ok(self
                    .tree
                    .alloc(Node::Print(operand), token.span.through(end)))
            }

            TokenKind::New => {
                self.advance();
                let class = self.expect_ident()?;
                let (args, end) = self.parse_args()?;
                Ok(self
                    .tree
                    .alloc(Node::New { class, args }, token.span.through(end)))
            }

            TokenKind::Identifier => self.parse_identifier_expr(),

            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span)),

            _ => Err(ParseError::expected_expression(
                token.span,
                &describe(&token),
            )),
        }
    }

    /// `'if' exp 'then' '{' exp '}' 'else' '{' exp '}'`
    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::Then)?;
        self.expect(TokenKind::LeftBrace)?;
        let then_branch = self.parse_expr(0)?;
        self.expect(TokenKind::RightBrace)?;
        self.expect(TokenKind::Else)?;
        self.expect(TokenKind::LeftBrace)?;
        let else_branch = self.parse_expr(0)?;
        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(self.tree.alloc(
            Node::If {
                cond,
                then_branch,
                else_branch,
            },
            start.through(end),
        ))
    }

    /// `ID`, `ID '(' args? ')'` or `ID '.' ID '(' args? ')'`
    fn parse_identifier_expr(&mut self) -> Result<NodeId, ParseError> {
        let id = self.expect_ident()?;

        match self.peek().kind {
            TokenKind::LeftParen => {
                let (args, end) = self.parse_args()?;
                let span = id.span.through(end);
                Ok(self.tree.alloc(Node::Call { id, args }, span))
            }
            TokenKind::Dot => {
                self.advance();
                let method = self.expect_ident()?;
                let (args, end) = self.parse_args()?;
                let span = id.span.through(end);
                Ok(self.tree.alloc(
                    Node::DotCall {
                        object: id,
                        method,
                        args,
                    },
                    span,
                ))
            }
            _ => {
                let span = id.span;
                Ok(self.tree.alloc(Node::Id(id), span))
            }
        }
    }

    /// `'(' (exp (',' exp)*)? ')'`, returning the arguments and the span of `)`.
    fn parse_args(&mut self) -> Result<(Vec<NodeId>, Span), ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end = self.expect(TokenKind::RightParen)?.span;
        Ok((args, end))
    }
}

fn parse_number(text: &str, span: Span) -> Result<Word, ParseError> {
    text.parse::<Word>().map_err(|error| {
        LexError::InvalidNumber {
            span,
            detail: format!("{text}: {error}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tree;
    use fool_core::ParseErrorKind;

    fn parse_body(source: &str) -> (Tree, NodeId) {
        let tree = Parser::parse(source).unwrap();
        let Node::Prog { body } = tree.node(tree.root().unwrap()) else {
            panic!("expected Prog");
        };
        let body = *body;
        (tree, body)
    }

    /// Render an expression fully parenthesized.
    fn render(tree: &Tree, id: NodeId) -> String {
        match tree.node(id) {
            Node::Int(v) => v.to_string(),
            Node::Bool(b) => b.to_string(),
            Node::Null => "null".into(),
            Node::Id(id) => id.name.clone(),
            Node::Binary { op, left, right } => {
                format!("({} {op} {})", render(tree, *left), render(tree, *right))
            }
            Node::Not(e) => format!("!{}", render(tree, *e)),
            Node::Print(e) => format!("print({})", render(tree, *e)),
            other => other.kind_name().to_string(),
        }
    }

    #[test]
    fn times_binds_tighter_than_plus() {
        let (tree, body) = parse_body("print(2+3*4);");
        assert_eq!(render(&tree, body), "print((2 + (3 * 4)))");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let (tree, body) = parse_body("10 - 4 - 3;");
        assert_eq!(render(&tree, body), "((10 - 4) - 3)");
    }

    #[test]
    fn comparison_below_arithmetic_above_logic() {
        let (tree, body) = parse_body("a + 1 <= b && c == d || e;");
        assert_eq!(render(&tree, body), "((((a + 1) <= b) && (c == d)) || e)");
    }

    #[test]
    fn not_takes_whole_expression() {
        let (tree, body) = parse_body("!a && b;");
        assert_eq!(render(&tree, body), "!(a && b)");
    }

    #[test]
    fn parentheses_group() {
        let (tree, body) = parse_body("(2 + 3) * 4;");
        assert_eq!(render(&tree, body), "((2 + 3) * 4)");
    }

    #[test]
    fn negative_literals() {
        let (tree, body) = parse_body("-2147483648;");
        assert_eq!(tree.node(body), &Node::Int(i32::MIN));
        let (tree, body) = parse_body("3 - -2;");
        assert_eq!(render(&tree, body), "(3 - -2)");
    }

    #[test]
    fn literal_out_of_range() {
        let errors = Parser::parse("2147483648;").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::Lexical)
        );
    }

    #[test]
    fn calls_and_objects() {
        let (tree, body) = parse_body("if o.get(1, x) == f() then { new C(true, null) } else { null };");
        let Node::If {
            cond,
            then_branch,
            else_branch,
        } = tree.node(body)
        else {
            panic!("expected If");
        };
        let Node::Binary { left, right, .. } = tree.node(*cond) else {
            panic!("expected Equal");
        };
        assert!(matches!(tree.node(*left), Node::DotCall { args, .. } if args.len() == 2));
        assert!(matches!(tree.node(*right), Node::Call { args, .. } if args.is_empty()));
        assert_eq!(
            tree.node(*then_branch).name().map(|id| id.name.as_str()),
            Some("C")
        );
        assert_eq!(tree.node(*else_branch), &Node::Null);
    }

    #[test]
    fn minus_requires_number() {
        let errors = Parser::parse("-x;").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::ExpectedToken)
        );
    }

    #[test]
    fn missing_operand() {
        let errors = Parser::parse("1 + ;").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::ExpectedExpression)
        );
    }
}
