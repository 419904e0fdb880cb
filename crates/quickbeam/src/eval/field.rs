//! Field access, place reads and object literals

use std::rc::Rc;

use super::{index, Evaluate};
use crate::ast::{Expr, Ident, PathSegment, Place, PlaceRoot};
use crate::error::type_name;
use crate::value::ObjectValue;
use crate::{Environment, EvalContext, EvalError, Value};

/// Read `receiver.field`.
pub fn get_field(receiver: &Value, field: &Ident) -> Result<Value, EvalError> {
    match receiver {
        Value::Object(obj) => obj.get(&field.name).ok_or_else(|| EvalError::UndefinedField {
            field: field.name.clone(),
            type_name: obj.type_name(),
            span: field.span,
        }),
        other => Err(EvalError::UndefinedField {
            field: field.name.clone(),
            type_name: type_name(other).to_string(),
            span: field.span,
        }),
    }
}

/// Read the value at the root of a place.
pub fn read_root(root: &PlaceRoot, env: &Environment) -> Result<Value, EvalError> {
    env.get(root.name()).ok_or_else(|| EvalError::UnboundName {
        name: root.name().to_string(),
        span: root.span(),
    })
}

/// Read a place (`copy x.y[i].z`).
pub fn read_place(place: &Place, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    let mut value = read_root(&place.root, env)?;
    for segment in &place.path {
        value = match segment {
            PathSegment::Field(field) => get_field(&value, field)?,
            PathSegment::Index { index: expr, span } => {
                let position = expr.eval(env, ctx)?;
                index::get_index(&value, &position, *span)?
            }
        };
    }
    Ok(value)
}

/// Build an object literal, evaluating field values in order.
pub fn eval_object(
    fields: &[(Ident, Expr)],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let mut values = Vec::with_capacity(fields.len());
    for (name, expr) in fields {
        values.push((name.name.clone(), expr.eval(env, ctx)?));
    }
    Ok(Value::Object(Rc::new(ObjectValue::literal(values))))
}
