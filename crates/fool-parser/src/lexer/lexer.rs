//! Main lexer implementation for FOOL.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, dispatching
//! on the first character of each token. Lexical errors are recorded and
//! surface as [`TokenKind::Error`] tokens so that scanning can continue.

use fool_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for FOOL source code.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Accumulated errors.
    errors: Vec<LexError>,
    /// Set once the end-of-file token has been produced.
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Scan the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> (Vec<Token<'src>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(error) = self.skip_trivia() {
            return self.make_error(error);
        }

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        let Some(first) = self.cursor.advance() else {
            self.finished = true;
            return Token::new(TokenKind::Eof, "", Span::new(start_line, start_col, 0));
        };

        let kind = match first {
            c if c.is_ascii_digit() => {
                self.cursor.eat_while(|c| c.is_ascii_digit());
                TokenKind::Num
            }
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_continue);
                let text = self.cursor.slice_from(start_offset);
                lookup_keyword(text).unwrap_or(TokenKind::Identifier)
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '!' => TokenKind::Bang,
            '=' if self.cursor.eat('=') => TokenKind::EqualEqual,
            '=' => TokenKind::Assign,
            '>' if self.cursor.eat('=') => TokenKind::GreaterEqual,
            '<' if self.cursor.eat('=') => TokenKind::LessEqual,
            '&' if self.cursor.eat('&') => TokenKind::AndAnd,
            '|' if self.cursor.eat('|') => TokenKind::OrOr,
            ch => {
                let span = Span::new(start_line, start_col, ch.len_utf8() as u32);
                return self.make_error(LexError::UnexpectedChar { ch, span });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Internal helpers
    // =========================================

    /// Skip whitespace and `/* ... */` comments.
    fn skip_trivia(&mut self) -> Option<LexError> {
        loop {
            self.cursor.eat_while(|c| c.is_ascii_whitespace());
            if !self.cursor.check_str("/*") {
                return None;
            }

            let start_line = self.cursor.line();
            let start_col = self.cursor.column();
            let start_offset = self.cursor.offset();
            self.cursor.advance();
            self.cursor.advance();

            loop {
                if self.cursor.check_str("*/") {
                    self.cursor.advance();
                    self.cursor.advance();
                    break;
                }
                if self.cursor.advance().is_none() {
                    let len = self.cursor.offset() - start_offset;
                    return Some(LexError::UnterminatedComment {
                        span: Span::new(start_line, start_col, len),
                    });
                }
            }
        }
    }

    /// Create a token from start position to current position.
    fn make_token(
        &self,
        kind: TokenKind,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'src> {
        let lexeme = self.cursor.slice_from(start_offset);
        let span = Span::new(start_line, start_col, lexeme.len() as u32);
        Token::new(kind, lexeme, span)
    }

    /// Create an error token and record the error.
    fn make_error(&mut self, error: LexError) -> Token<'src> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            None
        } else {
            Some(self.next_token())
        }
    }
}
