//! Error types for every interpreter phase

use thiserror::Error;

use crate::eval::ControlFlow;
use crate::span::Span;
use crate::value::Value;

/// Errors produced while turning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    /// A string literal ran into a newline or the end of input
    #[error("unterminated string literal")]
    UnterminatedString {
        /// Span of the opening quote
        span: Span,
    },

    /// An escape sequence the lexer does not know
    #[error("unknown character escape `\\{escape}`")]
    InvalidEscape {
        /// The character following the backslash
        escape: char,
        /// Span of the escape sequence
        span: Span,
    },

    /// A character that starts no token
    #[error("unexpected character `{found}`")]
    UnexpectedCharacter {
        /// The offending character
        found: char,
        /// Where it was found
        span: Span,
    },

    /// A number immediately followed by identifier characters
    #[error("malformed number literal `{text}`")]
    MalformedNumber {
        /// The literal as written
        text: String,
        /// Where it was found
        span: Span,
    },
}

/// Errors produced by the parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A token that does not fit the grammar at this point
    #[error("expected {expected}, found {found}")]
    Unexpected {
        /// Description of what the parser was looking for
        expected: String,
        /// Description of what it got
        found: String,
        /// Span of the found token
        span: Span,
    },

    /// An operator expression used directly as the operand of another operator
    #[error("nested {kind} expression must be parenthesized")]
    Unparenthesized {
        /// `binary` or `unary` or `copy`
        kind: &'static str,
        /// The nested expression as written
        nested: String,
        /// The whole expression with the required parentheses added
        suggestion: String,
        /// Span of the nested expression
        span: Span,
    },

    /// End of input inside an open delimiter
    #[error("unclosed delimiter `{delimiter}`")]
    Unclosed {
        /// The opening delimiter
        delimiter: char,
        /// Span of the opening delimiter
        span: Span,
    },

    /// `set` applied to something that is not a variable or field path
    #[error("invalid assignment target")]
    InvalidAssignTarget {
        /// Span of the target
        span: Span,
    },

    /// Two constructors in one class body
    #[error("class `{class}` already has a constructor")]
    DuplicateConstructor {
        /// Class name
        class: String,
        /// Span of the second constructor
        span: Span,
        /// Span of the first constructor
        previous: Span,
    },

    /// `else` on the line after the closing brace of an `if`
    #[error("`else` must be on the same line as the closing `}}` of the `if`")]
    DanglingElse {
        /// Span of the `else` keyword
        span: Span,
    },
}

/// Errors produced by the static binding resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A name with no declaration in scope
    #[error("cannot find variable `{name}` in this scope")]
    UndeclaredVariable {
        /// Variable name
        name: String,
        /// Where it was used
        span: Span,
    },

    /// A read of a binding whose value was moved out earlier
    #[error("use of moved value `{name}`")]
    UseAfterMove {
        /// Variable name
        name: String,
        /// Where it was used after the move
        span: Span,
        /// Where the value was moved
        moved_at: Span,
    },

    /// `set` on a binding without the reassign privilege
    #[error("cannot assign twice to immutable variable `{name}`")]
    IllegalReassign {
        /// Variable name
        name: String,
        /// The `set` statement
        span: Span,
        /// Where the binding was declared
        declared_at: Span,
    },

    /// In-place mutation through a binding without the mutate privilege
    #[error("cannot mutate `{name}`, as it is not declared as mutable")]
    IllegalMutate {
        /// Variable name (or `this`)
        name: String,
        /// The mutating statement or call
        span: Span,
        /// Where the binding was declared
        declared_at: Span,
    },

    /// A second declaration of a live name in the same scope
    #[error("the name `{name}` is defined multiple times")]
    DuplicateDeclaration {
        /// The repeated name
        name: String,
        /// The second declaration
        span: Span,
        /// The first declaration
        previous: Span,
    },

    /// A read of a `var` that has not been given a value yet
    #[error("used binding `{name}` isn't initialized")]
    Uninitialized {
        /// Variable name
        name: String,
        /// Where it was read
        span: Span,
        /// Where it was declared
        declared_at: Span,
    },

    /// `break` or `continue` outside of a loop body
    #[error("`{keyword}` outside of a loop")]
    MisplacedControl {
        /// `break` or `continue`
        keyword: &'static str,
        /// Span of the statement
        span: Span,
    },

    /// A use of a binding after `delete` removed it
    #[error("use of deleted variable `{name}`")]
    UseAfterDelete {
        /// Variable name
        name: String,
        /// Where it was used
        span: Span,
        /// The `delete` statement
        deleted_at: Span,
    },

    /// `delete` of a binding declared outside the enclosing function
    #[error("cannot delete `{name}`, it is captured from an enclosing scope")]
    IllegalDelete {
        /// Variable name
        name: String,
        /// The `delete` statement
        span: Span,
        /// Where the binding was declared
        declared_at: Span,
    },
}

/// Errors produced while evaluating a resolved program.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// `/` or `%` with a zero divisor
    #[error("attempt to divide by zero")]
    DivisionByZero {
        /// The division expression
        span: Span,
    },

    /// An operator or call applied to values of the wrong type
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// What went wrong
        message: String,
        /// The offending expression
        span: Span,
    },

    /// A field read or write on a value without that field
    #[error("no field `{field}` on value of type `{type_name}`")]
    UndefinedField {
        /// Field name
        field: String,
        /// Type (or class) of the receiver
        type_name: String,
        /// The field access
        span: Span,
    },

    /// A call with the wrong number of arguments
    #[error("`{name}` takes {expected} argument(s) but {got} were supplied")]
    ArityMismatch {
        /// Function, method or class name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
        /// The call expression
        span: Span,
    },

    /// Call depth exceeded the configured limit
    #[error("stack overflow: call depth exceeded {max}")]
    StackOverflow {
        /// The configured limit
        max: usize,
        /// The call that overflowed
        span: Span,
    },

    /// Write to a class field whose declaration forbids it
    #[error("cannot assign to field `{field}` of `{class}`: {reason}")]
    ImmutableField {
        /// Field name
        field: String,
        /// Class name
        class: String,
        /// Which privilege the field lacks
        reason: &'static str,
        /// The assignment
        span: Span,
    },

    /// A name with no runtime binding
    #[error("`{name}` is not bound at this point of execution")]
    UnboundName {
        /// Variable name
        name: String,
        /// Where it was read
        span: Span,
    },

    /// A list index that is negative, fractional or past the end
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// The index as evaluated
        index: f64,
        /// Length of the list
        len: usize,
        /// The indexing expression
        span: Span,
    },

    /// Control flow signal (`return`/`break`/`continue`), not a real error
    #[error("control flow")]
    ControlFlow(ControlFlow),
}

/// Errors raised by the runtime environment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvironmentError {
    /// Lookup or assignment of an unknown name
    #[error("undefined variable `{name}`")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },

    /// Call depth limit reached
    #[error("stack overflow: call depth {depth} reached the limit of {max}")]
    StackOverflow {
        /// Current depth
        depth: usize,
        /// Configured limit
        max: usize,
    },
}

impl EnvironmentError {
    /// Attach a source location, producing an evaluation error.
    pub fn at(self, span: Span) -> EvalError {
        match self {
            EnvironmentError::UndefinedVariable { name } => EvalError::UnboundName { name, span },
            EnvironmentError::StackOverflow { max, .. } => EvalError::StackOverflow { max, span },
        }
    }
}

/// Any error the interpreter pipeline can report.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Lexing failed
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Binding resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Evaluation failed
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result type alias for interpreter operations
pub type Result<T> = std::result::Result<T, Error>;

// ═══════════════════════════════════════════════════════════════════════
// Spans and Codes
// ═══════════════════════════════════════════════════════════════════════

impl LexError {
    /// Primary source location.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::UnexpectedCharacter { span, .. }
            | LexError::MalformedNumber { span, .. } => *span,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            LexError::UnterminatedString { .. } => "E0001",
            LexError::InvalidEscape { .. } => "E0002",
            LexError::UnexpectedCharacter { .. } => "E0003",
            LexError::MalformedNumber { .. } => "E0004",
        }
    }
}

impl ParseError {
    /// Primary source location.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { span, .. }
            | ParseError::Unparenthesized { span, .. }
            | ParseError::Unclosed { span, .. }
            | ParseError::InvalidAssignTarget { span }
            | ParseError::DuplicateConstructor { span, .. }
            | ParseError::DanglingElse { span } => *span,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Unexpected { .. } => "E0100",
            ParseError::Unparenthesized { .. } => "E0101",
            ParseError::Unclosed { .. } => "E0102",
            ParseError::InvalidAssignTarget { .. } => "E0103",
            ParseError::DuplicateConstructor { .. } => "E0104",
            ParseError::DanglingElse { .. } => "E0105",
        }
    }
}

impl ResolveError {
    /// Primary source location.
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UndeclaredVariable { span, .. }
            | ResolveError::UseAfterMove { span, .. }
            | ResolveError::IllegalReassign { span, .. }
            | ResolveError::IllegalMutate { span, .. }
            | ResolveError::DuplicateDeclaration { span, .. }
            | ResolveError::Uninitialized { span, .. }
            | ResolveError::MisplacedControl { span, .. }
            | ResolveError::UseAfterDelete { span, .. }
            | ResolveError::IllegalDelete { span, .. } => *span,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UndeclaredVariable { .. } => "E0200",
            ResolveError::UseAfterMove { .. } => "E0201",
            ResolveError::IllegalReassign { .. } => "E0202",
            ResolveError::IllegalMutate { .. } => "E0203",
            ResolveError::DuplicateDeclaration { .. } => "E0204",
            ResolveError::Uninitialized { .. } => "E0205",
            ResolveError::MisplacedControl { .. } => "E0206",
            ResolveError::UseAfterDelete { .. } => "E0207",
            ResolveError::IllegalDelete { .. } => "E0208",
        }
    }
}

impl EvalError {
    /// Primary source location, if the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            EvalError::DivisionByZero { span }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::UndefinedField { span, .. }
            | EvalError::ArityMismatch { span, .. }
            | EvalError::StackOverflow { span, .. }
            | EvalError::ImmutableField { span, .. }
            | EvalError::UnboundName { span, .. }
            | EvalError::IndexOutOfRange { span, .. } => Some(*span),
            EvalError::ControlFlow(_) => None,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero { .. } => "E0300",
            EvalError::TypeMismatch { .. } => "E0301",
            EvalError::UndefinedField { .. } => "E0302",
            EvalError::ArityMismatch { .. } => "E0303",
            EvalError::StackOverflow { .. } => "E0304",
            EvalError::ImmutableField { .. } => "E0305",
            EvalError::UnboundName { .. } => "E0306",
            EvalError::ControlFlow(_) => "E0307",
            EvalError::IndexOutOfRange { .. } => "E0308",
        }
    }
}

impl Error {
    /// Primary source location, if the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Lex(e) => Some(e.span()),
            Error::Parse(e) => Some(e.span()),
            Error::Resolve(e) => Some(e.span()),
            Error::Eval(e) => e.span(),
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Lex(e) => e.code(),
            Error::Parse(e) => e.code(),
            Error::Resolve(e) => e.code(),
            Error::Eval(e) => e.code(),
        }
    }

    /// Name of the phase that produced the error.
    pub fn phase(&self) -> &'static str {
        match self {
            Error::Lex(_) => "lex",
            Error::Parse(_) => "parse",
            Error::Resolve(_) => "resolve",
            Error::Eval(_) => "eval",
        }
    }
}

/// Get a human-readable type name for a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Function(_) => "function",
        Value::Class(_) => "class",
        Value::Object(_) => "object",
        Value::List(_) => "list",
    }
}
