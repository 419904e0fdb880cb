//! Statement and expression evaluation

pub mod assign;
pub mod binary;
pub mod call;
pub mod control;
pub mod field;
pub mod if_expr;
pub mod index;
pub mod item;
pub mod loops;
pub mod stmt;
pub mod unary;

use crate::ast::{Expr, Literal};
use crate::resolver::ResolvedProgram;
use crate::span::Span;
use crate::{Environment, EvalContext, EvalError, Value};

/// Trait for evaluating AST nodes to values.
///
/// This is the core abstraction for the tree-walking interpreter.
/// Expressions and statements implement it.
pub trait Evaluate {
    /// Evaluate this AST node in the given environment.
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expr {
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
        match self {
            Expr::Literal { value, .. } => Ok(value.eval_literal()),
            Expr::Ident(ident) => lookup(env, &ident.name, ident.span),
            Expr::This(span) => lookup(env, "this", *span),
            Expr::Binary { op, lhs, rhs, span } => binary::eval_binary(*op, lhs, rhs, *span, env, ctx),
            Expr::Unary { op, operand, span } => unary::eval_unary(*op, operand, *span, env, ctx),
            Expr::Copy { place, .. } => field::read_place(place, env, ctx),
            Expr::Call { callee, args, span } => call::eval_call(callee, args, *span, env, ctx),
            Expr::Field { object, field, .. } => {
                let receiver = object.eval(env, ctx)?;
                field::get_field(&receiver, field)
            }
            Expr::Object { fields, .. } => field::eval_object(fields, env, ctx),
            Expr::List { items, .. } => index::eval_list(items, env, ctx),
            Expr::Index {
                object,
                index,
                span,
            } => {
                let receiver = object.eval(env, ctx)?;
                let position = index.eval(env, ctx)?;
                index::get_index(&receiver, &position, *span)
            }
        }
    }
}

impl Literal {
    fn eval_literal(&self) -> Value {
        match self {
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Nil => Value::Nil,
        }
    }
}

/// Read a name from the environment.
fn lookup(env: &Environment, name: &str, span: Span) -> Result<Value, EvalError> {
    env.get(name).ok_or_else(|| EvalError::UnboundName {
        name: name.to_string(),
        span,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Program Entry Point
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate a resolved program in `env`.
///
/// The result is the value of a top-level `return`, otherwise the value of
/// the final statement when it is an expression statement, otherwise nil.
#[tracing::instrument(level = "debug", skip_all, fields(stmts = resolved.program.stmts.len()))]
pub fn evaluate(
    resolved: &ResolvedProgram,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match stmt::eval_stmts(&resolved.program.stmts, env, ctx) {
        Ok(value) => Ok(value),
        Err(EvalError::ControlFlow(cf)) => Ok(cf.into_value()),
        Err(e) => {
            tracing::debug!(error = %e, code = e.code(), "evaluation failed");
            Err(e)
        }
    }
}

/// Evaluate an expression (convenience wrapper).
pub fn eval_expr(expr: &Expr, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    expr.eval(env, ctx)
}

// Re-export for use by other modules
pub use control::ControlFlow;
pub use if_expr::eval_block;
