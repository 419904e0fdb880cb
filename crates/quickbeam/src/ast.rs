//! Abstract syntax tree

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::span::Span;

bitflags! {
    /// Privileges a binding (or class field) grants.
    ///
    /// `let` grants neither, `var` grants [`Grade::REASSIGN`], a `mut`
    /// suffix adds [`Grade::MUTATE`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Grade: u8 {
        /// May be the target of `set name = ...`
        const REASSIGN = 0b01;
        /// May be mutated in place (field writes, `mut` method calls)
        const MUTATE = 0b10;
    }
}

impl Grade {
    /// Declaration keywords that produce this grade.
    pub fn keyword(self) -> &'static str {
        match (self.contains(Grade::REASSIGN), self.contains(Grade::MUTATE)) {
            (false, false) => "let",
            (true, false) => "var",
            (false, true) => "let mut",
            (true, true) => "var mut",
        }
    }

    /// Name of the grade.
    pub fn describe(self) -> &'static str {
        match (self.contains(Grade::REASSIGN), self.contains(Grade::MUTATE)) {
            (false, false) => "Immutable",
            (true, false) => "Reassignable",
            (false, true) => "Mutable",
            (true, true) => "ReassignableMutable",
        }
    }
}

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// The name
    pub name: String,
    /// Where it appears
    pub span: Span,
}

impl Ident {
    /// Create an identifier.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A whole source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements in order
    pub stmts: Vec<Stmt>,
}

/// A `{ ... }` statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Statements in order
    pub stmts: Vec<Stmt>,
    /// From `{` to `}`
    pub span: Span,
}

impl Drop for Block {
    /// Flatten nested bodies onto a worklist so deeply nested blocks do not
    /// recurse through drop glue.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.stmts);
        while let Some(stmt) = pending.pop() {
            match stmt {
                Stmt::If(mut stmt) => {
                    for (_, mut body) in stmt.branches.drain(..) {
                        pending.append(&mut body.stmts);
                    }
                    if let Some(mut body) = stmt.otherwise.take() {
                        pending.append(&mut body.stmts);
                    }
                }
                Stmt::While(mut stmt) => pending.append(&mut stmt.body.stmts),
                Stmt::Function(decl) => {
                    if let Ok(mut decl) = Rc::try_unwrap(decl) {
                        pending.append(&mut decl.body.stmts);
                    }
                }
                _ => {}
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let`/`var` declaration
    Let(LetStmt),
    /// `set` assignment
    Set(SetStmt),
    /// Function declaration
    Function(Rc<FunctionDecl>),
    /// Class declaration
    Class(Rc<ClassDecl>),
    /// `if` / `else if` / `else`
    If(IfStmt),
    /// `while` loop
    While(WhileStmt),
    /// `return [expr]`
    Return {
        /// Returned expression, `nil` when absent
        value: Option<Expr>,
        /// The whole statement
        span: Span,
    },
    /// `break`
    Break(Span),
    /// `continue`
    Continue(Span),
    /// `print expr`
    Print {
        /// What to print
        value: Expr,
        /// The whole statement
        span: Span,
    },
    /// `delete name`
    Delete {
        /// The binding to drop
        name: Ident,
        /// The whole statement
        span: Span,
    },
    /// An expression evaluated for its effects (or as the program's value)
    Expr(Expr),
}

/// `let [mut] name = init` or `var [mut] name [= init]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    /// Privileges of the new binding
    pub grade: Grade,
    /// Bound name
    pub name: Ident,
    /// Initial value; only `var` may omit it
    pub init: Option<Expr>,
    /// The whole statement
    pub span: Span,
}

/// `set place = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetStmt {
    /// What is assigned
    pub target: Place,
    /// The new value
    pub value: Expr,
    /// The whole statement
    pub span: Span,
}

/// `if` with any number of `else if` arms.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// Condition and body of `if` and each `else if`
    pub branches: Vec<(Expr, Block)>,
    /// Final `else` body
    pub otherwise: Option<Block>,
    /// The whole statement
    pub span: Span,
}

/// `while cond { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    /// Loop condition
    pub cond: Expr,
    /// Loop body
    pub body: Block,
    /// The whole statement
    pub span: Span,
}

/// A variable or `this`, optionally followed by field and index segments.
///
/// Used as `set` targets and as the operand of `copy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Where the path starts
    pub root: PlaceRoot,
    /// Segments after the root
    pub path: Vec<PathSegment>,
    /// The whole place
    pub span: Span,
}

/// One step of a [`Place`] path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name`
    Field(Ident),
    /// `[index]`
    Index {
        /// Index expression
        index: Expr,
        /// From `[` to `]`
        span: Span,
    },
}

impl PathSegment {
    /// Where the segment appears.
    pub fn span(&self) -> Span {
        match self {
            PathSegment::Field(ident) => ident.span,
            PathSegment::Index { span, .. } => *span,
        }
    }
}

/// Start of a [`Place`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceRoot {
    /// A variable
    Ident(Ident),
    /// `this`
    This(Span),
}

impl PlaceRoot {
    /// The binding name the root refers to.
    pub fn name(&self) -> &str {
        match self {
            PlaceRoot::Ident(ident) => &ident.name,
            PlaceRoot::This(_) => "this",
        }
    }

    /// Where the root appears.
    pub fn span(&self) -> Span {
        match self {
            PlaceRoot::Ident(ident) => ident.span,
            PlaceRoot::This(span) => *span,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════

/// What role a function body plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Free `function`
    Function,
    /// Class method that cannot mutate `this`
    Method,
    /// `mut` class method
    MutMethod,
    /// Class `constructor`
    Constructor,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: Ident,
    /// Declared privileges (`var`, `mut`)
    pub grade: Grade,
}

/// A function, method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Name (`constructor` for constructors)
    pub name: Ident,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Function body
    pub body: Block,
    /// Role of the function
    pub kind: FunctionKind,
    /// From the first keyword to the closing `}`
    pub span: Span,
}

impl FunctionDecl {
    /// Privileges `this` gets inside the body.
    pub fn this_grade(&self) -> Grade {
        match self.kind {
            FunctionKind::Constructor | FunctionKind::MutMethod => Grade::MUTATE,
            FunctionKind::Function | FunctionKind::Method => Grade::empty(),
        }
    }
}

/// A field declared in a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: Ident,
    /// Privileges of the field
    pub grade: Grade,
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Class name
    pub name: Ident,
    /// Declared fields in order
    pub fields: Vec<FieldDecl>,
    /// Optional constructor
    pub constructor: Option<Rc<FunctionDecl>>,
    /// Methods in declaration order
    pub methods: Vec<Rc<FunctionDecl>>,
    /// From `class` to the closing `}`
    pub span: Span,
}

// ═══════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number
    Number(f64),
    /// String
    Str(Rc<str>),
    /// `true` / `false`
    Bool(bool),
    /// `nil`
    Nil,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
}

impl BinaryOp {
    /// Source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnaryOp {
    /// Source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal {
        /// The value
        value: Literal,
        /// Where it appears
        span: Span,
    },
    /// Variable read
    Ident(Ident),
    /// `this`
    This(Span),
    /// `lhs op rhs`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
        /// The whole expression
        span: Span,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
        /// The whole expression
        span: Span,
    },
    /// `copy place`
    Copy {
        /// What is read without moving
        place: Place,
        /// The whole expression
        span: Span,
    },
    /// `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expr>,
        /// Arguments in order
        args: Vec<Expr>,
        /// The whole expression
        span: Span,
    },
    /// `object.field`
    Field {
        /// Receiver
        object: Box<Expr>,
        /// Field name
        field: Ident,
        /// The whole expression
        span: Span,
    },
    /// `{ name: value, ... }`
    Object {
        /// Fields in order
        fields: Vec<(Ident, Expr)>,
        /// The whole literal
        span: Span,
    },
    /// `[a, b, ...]`
    List {
        /// Elements in order
        items: Vec<Expr>,
        /// The whole literal
        span: Span,
    },
    /// `list[index]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
        /// The whole expression
        span: Span,
    },
}

impl Expr {
    /// Source span of the expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Copy { span, .. }
            | Expr::Call { span, .. }
            | Expr::Field { span, .. }
            | Expr::Object { span, .. }
            | Expr::List { span, .. }
            | Expr::Index { span, .. } => *span,
            Expr::Ident(ident) => ident.span,
            Expr::This(span) => *span,
        }
    }

    /// Whether this expression needs parentheses to be an operand.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Expr::Binary { .. } | Expr::Unary { .. } | Expr::Copy { .. }
        )
    }
}

impl Stmt {
    /// Source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(stmt) => stmt.span,
            Stmt::Set(stmt) => stmt.span,
            Stmt::Function(decl) => decl.span,
            Stmt::Class(decl) => decl.span,
            Stmt::If(stmt) => stmt.span,
            Stmt::While(stmt) => stmt.span,
            Stmt::Return { span, .. } | Stmt::Print { span, .. } | Stmt::Delete { span, .. } => {
                *span
            }
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Expr(expr) => expr.span(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Display (re-inserts the parentheses the grammar requires)
// ═══════════════════════════════════════════════════════════════════════

/// Write `expr`, parenthesized if it is an operator expression.
fn fmt_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    if expr.is_operator() {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", crate::value::format_number(*n)),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.name())?;
        for segment in &self.path {
            match segment {
                PathSegment::Field(field) => write!(f, ".{}", field.name)?,
                PathSegment::Index { index, .. } => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => write!(f, "{}", value),
            Expr::Ident(ident) => write!(f, "{}", ident.name),
            Expr::This(_) => write!(f, "this"),
            Expr::Binary { op, lhs, rhs, .. } => {
                fmt_operand(f, lhs)?;
                write!(f, " {} ", op.as_str())?;
                fmt_operand(f, rhs)
            }
            Expr::Unary { op, operand, .. } => {
                write!(f, "{}", op.as_str())?;
                fmt_operand(f, operand)
            }
            Expr::Copy { place, .. } => write!(f, "copy {}", place),
            Expr::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Field { object, field, .. } => {
                fmt_operand(f, object)?;
                write!(f, ".{}", field.name)
            }
            Expr::Object { fields, .. } => {
                if fields.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name.name, value)?;
                }
                write!(f, " }}")
            }
            Expr::List { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expr::Index { object, index, .. } => {
                fmt_operand(f, object)?;
                write!(f, "[{}]", index)
            }
        }
    }
}
