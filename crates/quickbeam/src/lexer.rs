//! Lexer built on `logos`.
//!
//! Horizontal whitespace and `//` comments are skipped. Newlines are
//! significant and come out as [`TokenKind::Newline`] so the parser can
//! use them as statement terminators.

use std::fmt;

use logos::{Lexer, Logos};

use crate::error::LexError;
use crate::span::{LineIndex, Span};

/// Failure reasons reported by the token callbacks.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexErrorKind {
    /// No token matches
    #[default]
    UnexpectedCharacter,
    /// String ran into a newline or end of input
    UnterminatedString,
    /// Unknown `\x` escape
    InvalidEscape(char),
    /// Digits followed by identifier characters
    MalformedNumber,
}

/// Token kinds.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"([ \t\r\f]+|//[^\n]*)")]
#[logos(error = LexErrorKind)]
pub enum TokenKind {
    // === Layout ===
    /// Line break
    #[token("\n")]
    Newline,

    // === Keywords ===
    /// `function`
    #[token("function")]
    Function,
    /// `class`
    #[token("class")]
    Class,
    /// `constructor`
    #[token("constructor")]
    Constructor,
    /// `let`
    #[token("let")]
    Let,
    /// `var`
    #[token("var")]
    Var,
    /// `mut`
    #[token("mut")]
    Mut,
    /// `set`
    #[token("set")]
    Set,
    /// `copy`
    #[token("copy")]
    Copy,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `while`
    #[token("while")]
    While,
    /// `return`
    #[token("return")]
    Return,
    /// `break`
    #[token("break")]
    Break,
    /// `continue`
    #[token("continue")]
    Continue,
    /// `print`
    #[token("print")]
    Print,
    /// `delete`
    #[token("delete")]
    Delete,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `nil`
    #[token("nil")]
    Nil,
    /// `this`
    #[token("this")]
    This,
    /// `and`
    #[token("and")]
    And,
    /// `or`
    #[token("or")]
    Or,

    // === Literals ===
    /// Identifier
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    /// Number literal, always a float
    #[regex(r"[0-9]+(\.[0-9]+)?", parse_number)]
    #[regex(r"[0-9]+(\.[0-9]+)?[A-Za-z_][A-Za-z0-9_]*", malformed_number)]
    Number(f64),
    /// String literal with escapes already applied
    #[token("\"", lex_string)]
    Str(String),

    // === Delimiters ===
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `,`
    #[token(",")]
    Comma,
    /// `.`
    #[token(".")]
    Dot,
    /// `:`
    #[token(":")]
    Colon,
    /// `;`
    #[token(";")]
    Semicolon,

    // === Operators ===
    /// `=`
    #[token("=")]
    Assign,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `!`
    #[token("!")]
    Bang,
}

fn parse_number(lex: &mut Lexer<TokenKind>) -> Result<f64, LexErrorKind> {
    lex.slice()
        .parse()
        .map_err(|_| LexErrorKind::MalformedNumber)
}

fn malformed_number(_lex: &mut Lexer<TokenKind>) -> Result<f64, LexErrorKind> {
    Err(LexErrorKind::MalformedNumber)
}

/// Scan the body of a string literal after its opening quote.
fn lex_string(lex: &mut Lexer<TokenKind>) -> Result<String, LexErrorKind> {
    let rest = lex.remainder();
    let mut value = String::new();
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(i + 1);
                return Ok(value);
            }
            '\n' => {
                lex.bump(i);
                return Err(LexErrorKind::UnterminatedString);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, '0')) => value.push('\0'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, '"')) => value.push('"'),
                Some((j, '\n')) | Some((j, '\r')) => {
                    lex.bump(j);
                    return Err(LexErrorKind::UnterminatedString);
                }
                Some((j, other)) => {
                    lex.bump(j + other.len_utf8());
                    return Err(LexErrorKind::InvalidEscape(other));
                }
                None => break,
            },
            c => value.push(c),
        }
    }

    lex.bump(rest.len());
    Err(LexErrorKind::UnterminatedString)
}

/// A token with its source text and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is
    pub kind: TokenKind,
    /// The exact source text
    pub lexeme: String,
    /// Byte range in the source
    pub span: Span,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
}

impl Token {
    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Number(_) => format!("number `{}`", self.lexeme),
            TokenKind::Str(_) => format!("string {}", self.lexeme),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lexeme = if self.kind == TokenKind::Newline {
            "\\n"
        } else {
            self.lexeme.as_str()
        };
        write!(f, "{}:{} {:?} {}", self.line, self.column, self.kind, lexeme)
    }
}

/// Split `source` into tokens.
///
/// Stops at the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let index = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(kind) => {
                let (line, column) = index.line_col(source, span.start);
                tokens.push(Token {
                    kind,
                    lexeme: lexer.slice().to_string(),
                    span,
                    line,
                    column,
                });
            }
            Err(kind) => return Err(lex_error(kind, span, lexer.slice())),
        }
    }

    tracing::debug!(tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}

fn lex_error(kind: LexErrorKind, span: Span, slice: &str) -> LexError {
    match kind {
        LexErrorKind::UnexpectedCharacter => LexError::UnexpectedCharacter {
            found: slice.chars().next().unwrap_or('\0'),
            span,
        },
        LexErrorKind::UnterminatedString => LexError::UnterminatedString {
            span: Span::new(span.start, span.start + 1),
        },
        LexErrorKind::InvalidEscape(escape) => LexError::InvalidEscape {
            escape,
            span: Span::new(span.end - 1 - escape.len_utf8(), span.end),
        },
        LexErrorKind::MalformedNumber => LexError::MalformedNumber {
            text: slice.to_string(),
            span,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("let mut lettuce = copy x"),
            vec![
                TokenKind::Let,
                TokenKind::Mut,
                TokenKind::Ident("lettuce".into()),
                TokenKind::Assign,
                TokenKind::Copy,
                TokenKind::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn test_newlines_are_tokens_and_comments_skipped() {
        assert_eq!(
            kinds("a // trailing\n\tb"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Newline,
                TokenKind::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("<= >= == != < >"),
            vec![
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\tb\"c\\""#),
            vec![TokenKind::Str("a\tb\"c\\".into())]
        );
    }

    #[test]
    fn test_unterminated_string_points_at_quote() {
        let err = tokenize("print \"abc\nprint 1").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { span: Span::new(6, 7) });
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#""a\qb""#).unwrap_err();
        assert_eq!(
            err,
            LexError::InvalidEscape {
                escape: 'q',
                span: Span::new(2, 4),
            }
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("let a = 1 # 2").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { found: '#', .. }));
    }

    #[test]
    fn test_malformed_number() {
        let err = tokenize("12abc").unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { ref text, .. } if text == "12abc"));
    }

    #[test]
    fn test_list_brackets_and_delete() {
        assert_eq!(
            kinds("delete xs[0]"),
            vec![
                TokenKind::Delete,
                TokenKind::Ident("xs".into()),
                TokenKind::LBracket,
                TokenKind::Number(0.0),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("let a = 1\n  print a").unwrap();
        let print = &tokens[5];
        assert_eq!(print.kind, TokenKind::Print);
        assert_eq!((print.line, print.column), (2, 3));
        assert_eq!(print.lexeme, "print");
    }
}
