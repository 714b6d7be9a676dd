//! Recursive-descent parser for FOOL programs and declarations.
//!
//! Expressions are handled by the Pratt parser in `expr_parser`.

use fool_core::{LexError, ParseError, ParseErrorKind, ParseErrors, Span};

use super::node::{FunctionDecl, Ident, Node, NodeId, TypeAnnot};
use super::tree::Tree;
use super::types::Type;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parser for FOOL source code.
pub struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    position: usize,
    pub(super) tree: Tree,
    errors: ParseErrors,
}

impl<'src> Parser<'src> {
    /// Parse a complete program.
    ///
    /// Returns the tree, or every lexical and syntax error found.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &'src str) -> Result<Tree, ParseErrors> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        let mut parser = Parser::from_tokens(tokens, lex_errors);

        if let Err(error) = parser.parse_program() {
            parser.errors.push(error);
        }

        if parser.errors.is_empty() {
            Ok(parser.tree)
        } else {
            Err(parser.errors)
        }
    }

    fn from_tokens(tokens: Vec<Token<'src>>, lex_errors: Vec<LexError>) -> Self {
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error.into());
        }
        // Error tokens were already reported by the lexer.
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Error)
            .collect();
        Self {
            tokens,
            position: 0,
            tree: Tree::new(),
            errors,
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Token<'src> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead. Past the end this yields the EOF token.
    pub(super) fn peek_nth(&self, n: usize) -> Token<'src> {
        self.tokens
            .get(self.position + n)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", Span::new(1, 1, 0)))
    }

    /// Check if the current token is of the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the current token.
    pub(super) fn advance(&mut self) -> Token<'src> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Consume the current token if it is of the given kind.
    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail.
    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else if token.kind == TokenKind::Eof {
            Err(ParseError::unexpected_eof(token.span))
        } else {
            Err(ParseError::expected_token(
                token.span,
                kind.description(),
                &describe(&token),
            ))
        }
    }

    /// Consume an identifier or fail.
    pub(super) fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Ident::new(token.lexeme, token.span))
            }
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span)),
            _ => Err(ParseError::expected_identifier(token.span, &describe(&token))),
        }
    }

    /// Skip ahead to a token that can start the next declaration.
    fn synchronize(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Var | TokenKind::Fun | TokenKind::Class | TokenKind::In => return,
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.advance();
                    if matches!(
                        self.peek().kind,
                        TokenKind::Var | TokenKind::Fun | TokenKind::Class | TokenKind::In
                    ) {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Programs
    // =========================================================================

    fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let start = self.peek().span;

        let root = if self.eat(TokenKind::Let).is_some() {
            let mut classes = Vec::new();
            let declares_classes = self.check(TokenKind::Class);
            while self.check(TokenKind::Class) {
                match self.parse_class() {
                    Ok(class) => classes.push(class),
                    Err(error) => {
                        self.errors.push(error);
                        self.synchronize();
                    }
                }
            }

            let decs = self.parse_declarations(declares_classes)?;
            self.expect(TokenKind::In)?;
            let body = self.parse_expr(0)?;
            let end = self.expect(TokenKind::Semicolon)?.span;
            self.tree.alloc(
                Node::LetInProg {
                    classes,
                    decs,
                    body,
                },
                start.through(end),
            )
        } else {
            let body = self.parse_expr(0)?;
            let end = self.expect(TokenKind::Semicolon)?.span;
            self.tree.alloc(Node::Prog { body }, start.through(end))
        };

        while self.eat(TokenKind::Semicolon).is_some() {}
        let trailing = self.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                trailing.span,
                format!("expected end of file, found {}", describe(&trailing)),
            ));
        }

        self.tree.set_root(root);
        Ok(root)
    }

    /// Parse `dec*` up to `in`. At least one declaration is required unless
    /// classes were declared before.
    fn parse_declarations(&mut self, allow_empty: bool) -> Result<Vec<NodeId>, ParseError> {
        let mut decs = Vec::new();
        let mut attempted = allow_empty;
        loop {
            let token = self.peek();
            let result = match token.kind {
                TokenKind::Var => self.parse_var(),
                TokenKind::Fun => self.parse_function(false),
                TokenKind::Class => {
                    let misplaced = ParseError::new(
                        ParseErrorKind::MisplacedClass,
                        token.span,
                        "class declarations must precede variable and function declarations",
                    );
                    self.parse_class().and(Err(misplaced))
                }
                _ if !attempted => {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedDeclaration,
                        token.span,
                        format!("expected declaration, found {}", describe(&token)),
                    ));
                }
                _ => return Ok(decs),
            };
            attempted = true;
            match result {
                Ok(dec) => decs.push(dec),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// `class ID '(' fields? ')' '{' methdec* '}'`
    fn parse_class(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(TokenKind::Class)?.span;
        let id = self.expect_ident()?;

        self.expect(TokenKind::LeftParen)?;
        let mut fields = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let (field_id, ty) = self.parse_typed_name()?;
                let span = field_id.span.through(ty.span);
                fields.push(self.tree.alloc(Node::Field { id: field_id, ty }, span));
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        self.expect(TokenKind::LeftBrace)?;
        let mut methods = Vec::new();
        while self.check(TokenKind::Fun) {
            methods.push(self.parse_function(true)?);
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(self.tree.alloc(
            Node::ClassDec {
                id,
                fields,
                methods,
            },
            start.through(end),
        ))
    }

    /// `var ID ':' type '=' exp ';'`
    fn parse_var(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(TokenKind::Var)?.span;
        let (id, ty) = self.parse_typed_name()?;
        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(self
            .tree
            .alloc(Node::VarDec { id, ty, init }, start.through(end)))
    }

    /// `fun ID ':' type '(' params? ')' ('let' dec+ 'in')? exp ';'`
    fn parse_function(&mut self, is_method: bool) -> Result<NodeId, ParseError> {
        let start = self.expect(TokenKind::Fun)?.span;
        let (id, ret) = self.parse_typed_name()?;

        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let (param_id, ty) = self.parse_typed_name()?;
                let span = param_id.span.through(ty.span);
                params.push(self.tree.alloc(Node::Param { id: param_id, ty }, span));
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let mut decs = Vec::new();
        if self.eat(TokenKind::Let).is_some() {
            loop {
                match self.peek().kind {
                    TokenKind::Var => decs.push(self.parse_var()?),
                    TokenKind::Fun => decs.push(self.parse_function(false)?),
                    _ if decs.is_empty() => {
                        let token = self.peek();
                        return Err(ParseError::new(
                            ParseErrorKind::ExpectedDeclaration,
                            token.span,
                            format!("expected declaration, found {}", describe(&token)),
                        ));
                    }
                    _ => break,
                }
            }
            self.expect(TokenKind::In)?;
        }

        let body = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;

        let decl = FunctionDecl {
            id,
            ret,
            params,
            decs,
            body,
        };
        let node = if is_method {
            Node::MethodDec(decl)
        } else {
            Node::FunDec(decl)
        };
        Ok(self.tree.alloc(node, start.through(end)))
    }

    /// `ID ':' type`
    fn parse_typed_name(&mut self) -> Result<(Ident, TypeAnnot), ParseError> {
        let id = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok((id, ty))
    }

    /// `'int' | 'bool' | ID`
    fn parse_type(&mut self) -> Result<TypeAnnot, ParseError> {
        let token = self.peek();
        let ty = match token.kind {
            TokenKind::Int => Type::Int,
            TokenKind::Bool => Type::Bool,
            TokenKind::Identifier => Type::Ref(token.lexeme.to_string()),
            TokenKind::Eof => return Err(ParseError::unexpected_eof(token.span)),
            _ => return Err(ParseError::expected_type(token.span, &describe(&token))),
        };
        self.advance();
        Ok(TypeAnnot {
            ty,
            span: token.span,
        })
    }
}

/// Describe a token for error messages.
pub(super) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Identifier => format!("identifier '{}'", token.lexeme),
        TokenKind::Num => format!("number {}", token.lexeme),
        kind => kind.description().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    fn root(tree: &Tree) -> &Node {
        tree.node(tree.root().unwrap())
    }

    #[test]
    fn parses_plain_program() {
        let tree = Parser::parse("1 + 2;").unwrap();
        let Node::Prog { body } = root(&tree) else {
            panic!("expected Prog");
        };
        assert!(matches!(
            tree.node(*body),
            Node::Binary {
                op: BinaryOp::Plus,
                ..
            }
        ));
    }

    #[test]
    fn parses_let_in_program() {
        let tree = Parser::parse("let var x:int = 5; fun f:bool(a:int) a == 1; in f(x);").unwrap();
        let Node::LetInProg {
            classes,
            decs,
            body,
        } = root(&tree)
        else {
            panic!("expected LetInProg");
        };
        assert!(classes.is_empty());
        assert_eq!(decs.len(), 2);
        assert!(matches!(tree.node(decs[0]), Node::VarDec { id, .. } if id.name == "x"));
        let Node::FunDec(decl) = tree.node(decs[1]) else {
            panic!("expected FunDec");
        };
        assert_eq!(decl.params.len(), 1);
        assert_eq!(decl.ret.ty, Type::Bool);
        assert!(matches!(tree.node(*body), Node::Call { id, args } if id.name == "f" && args.len() == 1));
    }

    #[test]
    fn parses_class_with_methods() {
        let source = "let class Acc(total:int, open:bool) { \
                          fun get:int() total; \
                          fun add:int(n:int) let var t:int = total + n; in t; \
                      } \
                      var a:Acc = new Acc(1, true); \
                      in a.add(2);";
        let tree = Parser::parse(source).unwrap();
        let Node::LetInProg { classes, body, .. } = root(&tree) else {
            panic!("expected LetInProg");
        };
        let Node::ClassDec {
            id,
            fields,
            methods,
        } = tree.node(classes[0])
        else {
            panic!("expected ClassDec");
        };
        assert_eq!(id.name, "Acc");
        assert_eq!(fields.len(), 2);
        assert_eq!(methods.len(), 2);
        let Node::MethodDec(add) = tree.node(methods[1]) else {
            panic!("expected MethodDec");
        };
        assert_eq!(add.decs.len(), 1);
        assert!(matches!(
            tree.node(*body),
            Node::DotCall { object, method, .. } if object.name == "a" && method.name == "add"
        ));
    }

    #[test]
    fn class_only_let_is_allowed() {
        assert!(Parser::parse("let class C() {} in 1;").is_ok());
    }

    #[test]
    fn empty_let_is_rejected() {
        let errors = Parser::parse("let in 1;").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::ExpectedDeclaration)
        );
    }

    #[test]
    fn class_after_var_is_rejected() {
        let errors = Parser::parse("let var x:int = 1; class C() {} in x;").unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::MisplacedClass));
    }

    #[test]
    fn tolerates_trailing_semicolons() {
        assert!(Parser::parse("let var x:int = 5; in print(x); ;").is_ok());
    }

    #[test]
    fn rejects_trailing_tokens() {
        let errors = Parser::parse("1; 2;").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::UnexpectedToken)
        );
    }

    #[test]
    fn reports_several_declaration_errors() {
        let errors = Parser::parse("let var x:int 1; var y: = 2; in 0;").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn reports_lexical_errors() {
        let errors = Parser::parse("1 # 2;").unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Lexical));
    }

    #[test]
    fn missing_semicolon_at_eof() {
        let errors = Parser::parse("1 + 2").unwrap_err();
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::UnexpectedEof)
        );
    }
}
