//! Binary operation evaluation

use std::cmp::Ordering;
use std::rc::Rc;

use super::Evaluate;
use crate::ast::{BinaryOp, Expr};
use crate::error::type_name;
use crate::span::Span;
use crate::{Environment, EvalContext, EvalError, Value};

/// Evaluate `lhs op rhs`. `and`/`or` short-circuit.
pub fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match op {
        BinaryOp::And => {
            let left = lhs.eval(env, ctx)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(rhs.eval(env, ctx)?.is_truthy()))
        }
        BinaryOp::Or => {
            let left = lhs.eval(env, ctx)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(rhs.eval(env, ctx)?.is_truthy()))
        }
        _ => {
            let left = lhs.eval(env, ctx)?;
            let right = rhs.eval(env, ctx)?;
            apply_binary(op, left, right, span)
        }
    }
}

/// Apply a strict (non-short-circuit) operator to two values.
pub fn apply_binary(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::Ne => return Ok(Value::Bool(left != right)),
        BinaryOp::And => return Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => return Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        _ => {}
    }

    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => eval_number_op(op, *a, *b, span),
        (Value::String(a), Value::String(b)) => match op {
            BinaryOp::Add => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Ok(Value::from(s))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                Ok(Value::Bool(compare(op, a.as_ref().cmp(b.as_ref()))))
            }
            _ => Err(mismatch(op, &left, &right, span)),
        },
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            Ok(Value::List(Rc::new(a.concat(b))))
        }
        _ => Err(mismatch(op, &left, &right, span)),
    }
}

fn eval_number_op(op: BinaryOp, a: f64, b: f64, span: Span) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::DivisionByZero { span });
        }
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Mod => Value::Number(a % b),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => match a.partial_cmp(&b) {
            Some(ordering) => Value::Bool(compare(op, ordering)),
            // NaN compares false
            None => Value::Bool(false),
        },
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        // Numbers are always truthy
        BinaryOp::And | BinaryOp::Or => Value::Bool(true),
    };
    Ok(value)
}

fn compare(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => false,
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value, span: Span) -> EvalError {
    EvalError::TypeMismatch {
        message: format!(
            "cannot apply `{}` to `{}` and `{}`",
            op.as_str(),
            type_name(left),
            type_name(right)
        ),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: BinaryOp, l: impl Into<Value>, r: impl Into<Value>) -> Result<Value, EvalError> {
        apply_binary(op, l.into(), r.into(), Span::new(0, 1))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply(BinaryOp::Add, 2.0, 3.0).unwrap(), Value::Number(5.0));
        assert_eq!(apply(BinaryOp::Mod, 7.0, 3.0).unwrap(), Value::Number(1.0));
        assert_eq!(apply(BinaryOp::Div, 1.0, 4.0).unwrap(), Value::Number(0.25));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            apply(BinaryOp::Div, 1.0, 0.0),
            Err(EvalError::DivisionByZero { .. })
        ));
        assert!(matches!(
            apply(BinaryOp::Mod, 1.0, 0.0),
            Err(EvalError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_string_concat_and_compare() {
        assert_eq!(apply(BinaryOp::Add, "ab", "cd").unwrap(), Value::string("abcd"));
        assert_eq!(apply(BinaryOp::Lt, "a", "b").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_mixed_types() {
        let err = apply(BinaryOp::Add, "a", 1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: cannot apply `+` to `string` and `number`"
        );
        assert_eq!(apply(BinaryOp::Eq, "1", 1.0).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_list_concatenation() {
        let left = Value::list(vec![Value::Number(1.0)]);
        let right = Value::list(vec![Value::Number(2.0), Value::Number(3.0)]);
        let joined = apply(BinaryOp::Add, left.clone(), right).unwrap();
        assert_eq!(joined.to_string(), "[1, 2, 3]");
        assert_ne!(joined, left);
        assert!(apply(BinaryOp::Sub, left.clone(), left).is_err());
    }
}
