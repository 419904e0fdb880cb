//! `set` statement evaluation

use super::field::read_root;
use super::{index, Evaluate};
use crate::ast::{Grade, Ident, PathSegment, SetStmt};
use crate::error::type_name;
use crate::value::FieldError;
use crate::{Environment, EvalContext, EvalError, Value};

/// Evaluate `set place = value`.
///
/// A bare name rebinds the variable. A path walks to the owning object or
/// list and writes the last segment, honoring the declared field grades of
/// class instances. List elements carry no grades of their own.
pub fn eval_set(stmt: &SetStmt, env: &mut Environment, ctx: &EvalContext) -> Result<(), EvalError> {
    let value = stmt.value.eval(env, ctx)?;
    let place = &stmt.target;

    let Some((last, intermediate)) = place.path.split_last() else {
        return env
            .assign(place.root.name(), value)
            .map_err(|e| e.at(place.root.span()));
    };

    let mut owner = read_root(&place.root, env)?;
    for segment in intermediate {
        owner = match segment {
            PathSegment::Field(field) => step_through(&owner, field)?,
            PathSegment::Index { index: expr, span } => {
                let position = expr.eval(env, ctx)?;
                index::get_index(&owner, &position, *span)?
            }
        };
    }

    match last {
        PathSegment::Field(field) => write_field(&owner, field, value),
        PathSegment::Index { index: expr, span } => {
            let position = expr.eval(env, ctx)?;
            index::set_index(&owner, &position, value, *span)
        }
    }
}

/// Read an intermediate field whose contents are about to be mutated.
fn step_through(owner: &Value, field: &Ident) -> Result<Value, EvalError> {
    let obj = owner
        .as_object()
        .ok_or_else(|| undefined(field, type_name(owner)))?;
    let grade = obj
        .field_grade(&field.name)
        .ok_or_else(|| undefined(field, &obj.type_name()))?;

    if let Some(class) = obj.class() {
        if !obj.is_initializing() && !grade.contains(Grade::MUTATE) {
            return Err(EvalError::ImmutableField {
                field: field.name.clone(),
                class: class.name().to_string(),
                reason: "field is not declared `mut`",
                span: field.span,
            });
        }
    }
    obj.get(&field.name)
        .ok_or_else(|| undefined(field, &obj.type_name()))
}

fn write_field(owner: &Value, field: &Ident, value: Value) -> Result<(), EvalError> {
    let obj = owner
        .as_object()
        .ok_or_else(|| undefined(field, type_name(owner)))?;
    obj.set(&field.name, value).map_err(|e| match e {
        FieldError::Missing => undefined(field, &obj.type_name()),
        FieldError::NotReassignable => EvalError::ImmutableField {
            field: field.name.clone(),
            class: obj.type_name(),
            reason: "field is not declared `var`",
            span: field.span,
        },
    })
}

fn undefined(field: &Ident, type_name: &str) -> EvalError {
    EvalError::UndefinedField {
        field: field.name.clone(),
        type_name: type_name.to_string(),
        span: field.span,
    }
}
