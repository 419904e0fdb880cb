//! Recursive-descent parser
//!
//! Statements are terminated by a newline, a `;`, a closing `}` or the end
//! of input. A run of newlines followed by `.` or `(` does not end the
//! statement; the expression continues as a field access or call chain.
//!
//! Operators have no precedence: an operand of a binary or unary operator
//! must itself be a primary expression, so `a + b + c` is rejected in favor
//! of `(a + b) + c`.

mod expr;
mod stmt;

use crate::ast::{Ident, Program};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// Parser state over a token slice.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Open delimiters, innermost last, for "unclosed" reporting at EOF
    delimiters: Vec<(char, Span)>,
    eof: Span,
}

/// Parse a full token stream into a [`Program`].
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let program = Parser::new(tokens).parse_program()?;
    tracing::debug!(statements = program.stmts.len(), "parsed program");
    Ok(program)
}

impl<'t> Parser<'t> {
    /// Create a parser positioned at the first token.
    pub fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
        Self {
            tokens,
            pos: 0,
            delimiters: Vec::new(),
            eof: Span::point(end),
        }
    }

    /// Parse statements until the end of input.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.at_eof() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Cursor
    // ═══════════════════════════════════════════════════════════════════

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'t TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Kind of the first token after any newlines.
    fn peek_past_newlines(&self) -> Option<&'t TokenKind> {
        let tokens: &'t [Token] = self.tokens;
        tokens
            .get(self.pos..)
            .unwrap_or_default()
            .iter()
            .map(|t| &t.kind)
            .find(|kind| **kind != TokenKind::Newline)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the next token, or the end of input.
    fn peek_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(self.eof)
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn bump(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<&'t Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == *kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<Ident, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
                ..
            }) => {
                self.pos += 1;
                Ok(Ident::new(name.clone(), *span))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&TokenKind::Newline) {}
    }

    /// Skip blank lines and stray `;` between statements.
    fn skip_separators(&mut self) {
        while self.eat(&TokenKind::Newline) || self.eat(&TokenKind::Semicolon) {}
    }

    // ═══════════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Error for the next token not matching `expected`.
    ///
    /// At end of input inside a delimiter this reports the delimiter instead.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::Unexpected {
                expected: expected.to_string(),
                found: token.describe(),
                span: token.span,
            },
            None => match self.delimiters.last() {
                Some(&(delimiter, span)) => ParseError::Unclosed { delimiter, span },
                None => ParseError::Unexpected {
                    expected: expected.to_string(),
                    found: "end of input".to_string(),
                    span: self.eof,
                },
            },
        }
    }

    /// Run `f` with `delimiter` registered as open.
    fn delimited<T>(
        &mut self,
        delimiter: char,
        span: Span,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.delimiters.push((delimiter, span));
        let result = f(self);
        self.delimiters.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Result<Program, ParseError> {
        parse(&tokenize(src).expect("lex failed"))
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse_src("\n\n;\n").unwrap().stmts.len(), 0);
    }

    #[test]
    fn test_eof_inside_paren_reports_unclosed() {
        let err = parse_src("print (1 + 2").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unclosed {
                delimiter: '(',
                span: Span::new(6, 7),
            }
        );
    }

    #[test]
    fn test_eof_at_top_level_reports_end_of_input() {
        let err = parse_src("let x =").unwrap_err();
        assert!(
            matches!(err, ParseError::Unexpected { ref found, .. } if found == "end of input")
        );
    }
}
