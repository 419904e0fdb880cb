//! Unary operation evaluation

use super::Evaluate;
use crate::ast::{Expr, UnaryOp};
use crate::error::type_name;
use crate::span::Span;
use crate::{Environment, EvalContext, EvalError, Value};

/// Evaluate `op operand`.
pub fn eval_unary(
    op: UnaryOp,
    operand: &Expr,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let value = operand.eval(env, ctx)?;
    apply_unary(op, value, span)
}

/// Apply a unary operator to a value.
pub fn apply_unary(op: UnaryOp, value: Value, span: Span) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Neg => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(EvalError::TypeMismatch {
                message: format!("cannot negate `{}`", type_name(&other)),
                span,
            }),
        },
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_number() {
        let v = apply_unary(UnaryOp::Neg, Value::Number(2.0), Span::default()).unwrap();
        assert_eq!(v, Value::Number(-2.0));
    }

    #[test]
    fn test_negate_string_fails() {
        let err = apply_unary(UnaryOp::Neg, Value::string("x"), Span::default()).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_not_uses_truthiness() {
        assert_eq!(
            apply_unary(UnaryOp::Not, Value::Nil, Span::default()).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_unary(UnaryOp::Not, Value::Number(0.0), Span::default()).unwrap(),
            Value::Bool(false)
        );
    }
}
