//! Rust-style rendering of errors from every phase
//!
//! ```text
//! error[E0201]: use of moved value `x`
//!  --> main.qb:3:7
//!   |
//! 2 | print x
//!   |       - value moved here
//! 3 | print x
//!   |       ^ value used here after move
//!   |
//!   = help: read it with `copy x` to keep the value
//! ```

use std::fmt::Write;

use crate::error::{Error, EvalError, LexError, ParseError, ResolveError};
use crate::span::{LineIndex, Span};

/// Name shown after `-->` when the caller gives none.
pub const DEFAULT_SOURCE_NAME: &str = "<input>";

/// A source location with a message attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Where the label points
    pub span: Span,
    /// Text printed after the underline
    pub message: String,
    /// Primary labels are underlined with `^`, secondary with `-`
    pub primary: bool,
}

/// A renderable error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable error code, e.g. `E0201`
    pub code: &'static str,
    /// Headline
    pub message: String,
    /// Annotated source locations
    pub labels: Vec<Label>,
    /// `= note:` lines
    pub notes: Vec<String>,
    /// `= help:` line
    pub help: Option<String>,
}

impl Diagnostic {
    /// An error with no labels yet.
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    /// Add the primary label.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: true,
        });
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: false,
        });
        self
    }

    /// Add a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Set the help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The first primary label.
    pub fn primary(&self) -> Option<&Label> {
        self.labels.iter().find(|l| l.primary)
    }

    /// Render against `source`, naming it `name` in the `-->` line.
    pub fn render(&self, source: &str, name: &str) -> String {
        let index = LineIndex::new(source);
        let mut out = String::new();
        let _ = writeln!(out, "error[{}]: {}", self.code, self.message);

        let mut labels: Vec<&Label> = self.labels.iter().collect();
        labels.sort_by_key(|l| (l.span.start, !l.primary));

        let width = labels
            .iter()
            .map(|l| digits(index.line(l.span.start)))
            .max()
            .unwrap_or(1);
        let pad = " ".repeat(width);

        if let Some(primary) = self.primary() {
            let (line, col) = index.line_col(source, primary.span.start);
            let _ = writeln!(out, "{}--> {}:{}:{}", pad, name, line, col);
        }

        if !labels.is_empty() {
            let _ = writeln!(out, "{} |", pad);
            let mut last_line = None;
            for label in labels {
                let (line, col) = index.line_col(source, label.span.start);
                let text = index.line_text(source, line);
                if last_line != Some(line) {
                    if matches!(last_line, Some(prev) if line > prev + 1) {
                        let _ = writeln!(out, "...");
                    }
                    let _ = writeln!(out, "{:>width$} | {}", line, text, width = width);
                    last_line = Some(line);
                }
                let _ = writeln!(out, "{} | {}", pad, underline(source, text, label, col));
            }
            let _ = writeln!(out, "{} |", pad);
        }

        for note in &self.notes {
            let _ = writeln!(out, "{} = note: {}", pad, note);
        }
        if let Some(help) = &self.help {
            let _ = writeln!(out, "{} = help: {}", pad, help);
        }
        out
    }
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

/// Marker line for `label` on a source line whose text is `text`.
/// Spans running past the end of the line are cut at the line end.
fn underline(source: &str, text: &str, label: &Label, col: usize) -> String {
    let available = text.chars().count().saturating_sub(col - 1);
    let span_len = source
        .get(label.span.start..label.span.end)
        .map_or(0, |s| s.chars().count());
    let len = span_len.min(available).max(1);
    let marker = if label.primary { "^" } else { "-" };

    let mut line = format!("{}{}", " ".repeat(col - 1), marker.repeat(len));
    if !label.message.is_empty() {
        line.push(' ');
        line.push_str(&label.message);
    }
    line
}

// ═══════════════════════════════════════════════════════════════════════
// Conversion from Phase Errors
// ═══════════════════════════════════════════════════════════════════════

impl From<&LexError> for Diagnostic {
    fn from(err: &LexError) -> Self {
        let diag = Diagnostic::error(err.code(), err.to_string());
        match err {
            LexError::UnterminatedString { span } => diag
                .with_label(*span, "string starts here")
                .with_help("close the string with `\"` before the end of the line"),
            LexError::InvalidEscape { span, .. } => diag
                .with_label(*span, "unknown escape")
                .with_note("supported escapes are `\\n`, `\\t`, `\\r`, `\\0`, `\\\\` and `\\\"`"),
            LexError::UnexpectedCharacter { span, .. } => {
                diag.with_label(*span, "not valid in this language")
            }
            LexError::MalformedNumber { span, .. } => diag
                .with_label(*span, "invalid number")
                .with_help("separate the number from the name that follows it"),
        }
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        let diag = Diagnostic::error(err.code(), err.to_string());
        match err {
            ParseError::Unexpected { expected, span, .. } => {
                diag.with_label(*span, format!("expected {}", expected))
            }
            ParseError::Unparenthesized {
                kind,
                suggestion,
                span,
                ..
            } => diag
                .with_label(*span, format!("this {} expression needs parentheses", kind))
                .with_note("operators never nest without explicit parentheses")
                .with_help(format!("write `{}`", suggestion)),
            ParseError::Unclosed { span, .. } => diag.with_label(*span, "unclosed delimiter"),
            ParseError::InvalidAssignTarget { span } => diag
                .with_label(*span, "cannot assign to this expression")
                .with_help("`set` takes a variable or a field path such as `a.b`"),
            ParseError::DuplicateConstructor { span, previous, .. } => diag
                .with_secondary_label(*previous, "first constructor here")
                .with_label(*span, "second constructor"),
            ParseError::DanglingElse { span } => diag
                .with_label(*span, "`else` starts a new line")
                .with_help("move `else` after the `}` that closes the `if` block"),
        }
    }
}

impl From<&ResolveError> for Diagnostic {
    fn from(err: &ResolveError) -> Self {
        let diag = Diagnostic::error(err.code(), err.to_string());
        match err {
            ResolveError::UndeclaredVariable { span, .. } => {
                diag.with_label(*span, "not found in this scope")
            }
            ResolveError::UseAfterMove {
                name,
                span,
                moved_at,
            } => diag
                .with_secondary_label(*moved_at, "value moved here")
                .with_label(*span, "value used here after move")
                .with_help(format!("read it with `copy {}` to keep the value", name)),
            ResolveError::IllegalReassign {
                name,
                span,
                declared_at,
            } => diag
                .with_secondary_label(*declared_at, format!("`{}` declared here", name))
                .with_label(*span, "cannot assign twice to immutable variable")
                .with_help(format!("declare it with `var {}` to allow reassignment", name)),
            ResolveError::IllegalMutate {
                name,
                span,
                declared_at,
            } => {
                let help = if name == "this" {
                    "declare the method `mut` to let it mutate `this`".to_string()
                } else {
                    format!("declare it with `let mut {}` to allow mutation", name)
                };
                diag.with_secondary_label(*declared_at, format!("`{}` declared here", name))
                    .with_label(*span, "cannot mutate")
                    .with_help(help)
            }
            ResolveError::DuplicateDeclaration {
                name,
                span,
                previous,
            } => diag
                .with_secondary_label(*previous, format!("previous declaration of `{}` here", name))
                .with_label(*span, format!("`{}` redefined here", name)),
            ResolveError::Uninitialized {
                name,
                span,
                declared_at,
            } => diag
                .with_secondary_label(*declared_at, "declared here without a value")
                .with_label(*span, format!("`{}` used here but it isn't initialized", name))
                .with_help(format!("`set {} = ...` before reading it", name)),
            ResolveError::MisplacedControl { keyword, span } => {
                diag.with_label(*span, format!("cannot `{}` outside of a loop", keyword))
            }
            ResolveError::UseAfterDelete {
                name,
                span,
                deleted_at,
            } => diag
                .with_secondary_label(*deleted_at, format!("`{}` deleted here", name))
                .with_label(*span, "used here after delete")
                .with_help(format!("declare `{}` again before using it", name)),
            ResolveError::IllegalDelete {
                name,
                span,
                declared_at,
            } => diag
                .with_secondary_label(*declared_at, format!("`{}` declared here", name))
                .with_label(*span, "cannot delete a captured variable")
                .with_note("only bindings declared in the current function can be deleted"),
        }
    }
}

impl From<&EvalError> for Diagnostic {
    fn from(err: &EvalError) -> Self {
        let diag = Diagnostic::error(err.code(), err.to_string());
        match err {
            EvalError::DivisionByZero { span } => diag.with_label(*span, "division by zero"),
            EvalError::TypeMismatch { span, .. } => diag.with_label(*span, "invalid operand types"),
            EvalError::UndefinedField { span, .. } => diag.with_label(*span, "unknown field"),
            EvalError::ArityMismatch { expected, span, .. } => {
                diag.with_label(*span, format!("expected {} argument(s)", expected))
            }
            EvalError::StackOverflow { span, .. } => diag
                .with_label(*span, "call depth limit reached here")
                .with_note("the limit is set with `--max-depth`"),
            EvalError::ImmutableField { span, .. } => diag.with_label(*span, "cannot assign"),
            EvalError::UnboundName { span, .. } => diag
                .with_label(*span, "no value bound yet")
                .with_note("a hoisted function ran before a variable it uses was defined"),
            EvalError::IndexOutOfRange { len, span, .. } => {
                let note = match len {
                    0 => "the list is empty".to_string(),
                    n => format!("valid indices are whole numbers from 0 to {}", n - 1),
                };
                diag.with_label(*span, "index out of range").with_note(note)
            }
            EvalError::ControlFlow(cf) => {
                diag.with_note(format!("`{}` escaped its enclosing construct", cf.keyword()))
            }
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        match err {
            Error::Lex(e) => e.into(),
            Error::Parse(e) => e.into(),
            Error::Resolve(e) => e.into(),
            Error::Eval(e) => e.into(),
        }
    }
}

/// Render `error` against `source` with Rust-style annotations and no color.
pub fn render(error: &Error, source: &str) -> String {
    render_named(error, source, DEFAULT_SOURCE_NAME)
}

/// Like [`render`], naming the source `name` in the `-->` line.
pub fn render_named(error: &Error, source: &str, name: &str) -> String {
    Diagnostic::from(error).render(source, name)
}
