//! List literals and indexing

use super::Evaluate;
use crate::ast::Expr;
use crate::error::type_name;
use crate::span::Span;
use crate::value::ListValue;
use crate::{Environment, EvalContext, EvalError, Value};

/// Build a list literal, evaluating items in order.
pub fn eval_list(items: &[Expr], env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(item.eval(env, ctx)?);
    }
    Ok(Value::list(values))
}

/// Read `receiver[index]`.
pub fn get_index(receiver: &Value, index: &Value, span: Span) -> Result<Value, EvalError> {
    let list = as_indexable(receiver, span)?;
    let i = to_index(list, index, span)?;
    list.get(i).ok_or_else(|| out_of_range(i as f64, list.len(), span))
}

/// Write `receiver[index] = value`.
pub fn set_index(receiver: &Value, index: &Value, value: Value, span: Span) -> Result<(), EvalError> {
    let list = as_indexable(receiver, span)?;
    let i = to_index(list, index, span)?;
    if list.set(i, value) {
        Ok(())
    } else {
        Err(out_of_range(i as f64, list.len(), span))
    }
}

fn as_indexable(receiver: &Value, span: Span) -> Result<&ListValue, EvalError> {
    receiver
        .as_list()
        .map(|list| list.as_ref())
        .ok_or_else(|| EvalError::TypeMismatch {
            message: format!("`{}` cannot be indexed", type_name(receiver)),
            span,
        })
}

/// Convert an index value to a position in `list`.
fn to_index(list: &ListValue, index: &Value, span: Span) -> Result<usize, EvalError> {
    let n = index.as_number().ok_or_else(|| EvalError::TypeMismatch {
        message: format!("list index must be a `number`, found `{}`", type_name(index)),
        span,
    })?;
    if n < 0.0 || n.fract() != 0.0 || n >= list.len() as f64 {
        return Err(out_of_range(n, list.len(), span));
    }
    Ok(n as usize)
}

fn out_of_range(index: f64, len: usize, span: Span) -> EvalError {
    EvalError::IndexOutOfRange { index, len, span }
}
