//! Function, method and constructor calls

use std::rc::Rc;

use super::control::ControlFlow;
use super::stmt::eval_stmts;
use super::Evaluate;
use crate::ast::{Expr, Ident};
use crate::error::type_name;
use crate::span::Span;
use crate::stack::ensure_sufficient_stack;
use crate::value::{ClassValue, FunctionValue, ObjectValue};
use crate::{Environment, EvalContext, EvalError, Value};

/// Evaluate `callee(args)`.
///
/// `object.name(args)` calls a function stored in field `name` without a
/// receiver, or else the class method `name` with `this` bound to `object`.
pub fn eval_call(
    callee: &Expr,
    args: &[Expr],
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if let Expr::Field { object, field, .. } = callee {
        let receiver = object.eval(env, ctx)?;
        let args = eval_args(args, env, ctx)?;
        return call_method(receiver, field, args, span, env, ctx);
    }

    let target = callee.eval(env, ctx)?;
    let args = eval_args(args, env, ctx)?;
    call_value(&target, args, span, env, ctx)
}

fn eval_args(args: &[Expr], env: &mut Environment, ctx: &EvalContext) -> Result<Vec<Value>, EvalError> {
    args.iter().map(|arg| arg.eval(env, ctx)).collect()
}

/// Call a function or instantiate a class.
pub fn call_value(
    target: &Value,
    args: Vec<Value>,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    match target {
        Value::Function(func) => call_function(func, None, args, span, env, ctx),
        Value::Class(class) => instantiate(class, args, span, env, ctx),
        other => Err(EvalError::TypeMismatch {
            message: format!("`{}` is not callable", type_name(other)),
            span,
        }),
    }
}

fn call_method(
    receiver: Value,
    name: &Ident,
    args: Vec<Value>,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let Value::Object(obj) = &receiver else {
        return Err(EvalError::UndefinedField {
            field: name.name.clone(),
            type_name: type_name(&receiver).to_string(),
            span: name.span,
        });
    };

    if let Some(stored) = obj.get(&name.name) {
        return call_value(&stored, args, span, env, ctx);
    }

    let method = obj.class().and_then(|class| class.method(&name.name));
    match method {
        Some(method) => call_function(&method, Some(receiver.clone()), args, span, env, ctx),
        None => Err(EvalError::UndefinedField {
            field: name.name.clone(),
            type_name: obj.type_name(),
            span: name.span,
        }),
    }
}

/// Call a function, binding `this` when a receiver is given.
///
/// Parameters and the body share one scope nested in the function's
/// closure. A `return` becomes the call's value; falling off the end
/// yields nil.
#[tracing::instrument(level = "trace", skip_all, fields(function = func.name(), args = args.len()))]
pub fn call_function(
    func: &FunctionValue,
    this: Option<Value>,
    args: Vec<Value>,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if args.len() != func.arity() {
        return Err(EvalError::ArityMismatch {
            name: func.name().to_string(),
            expected: func.arity(),
            got: args.len(),
            span,
        });
    }

    ensure_sufficient_stack(|| {
        let mut frame = env.call_frame(&func.closure).map_err(|e| e.at(span))?;

        if let Some(this) = this {
            frame.define_with_grade("this", this, func.decl.this_grade());
        }
        for (param, arg) in func.decl.params.iter().zip(args) {
            frame.define_with_grade(param.name.name.clone(), arg, param.grade);
        }

        match eval_stmts(&func.decl.body.stmts, &mut frame, ctx) {
            Ok(_) => Ok(Value::Nil),
            Err(EvalError::ControlFlow(ControlFlow::Return { value })) => Ok(value),
            Err(e) => Err(e),
        }
    })
}

/// Construct an instance of `class`.
///
/// Fields start as nil. The constructor runs with `this` bound to the new
/// object; its result replaces the object only when it returns non-nil.
pub fn instantiate(
    class: &Rc<ClassValue>,
    args: Vec<Value>,
    span: Span,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    if args.len() != class.arity() {
        return Err(EvalError::ArityMismatch {
            name: class.name().to_string(),
            expected: class.arity(),
            got: args.len(),
            span,
        });
    }

    let obj = Rc::new(ObjectValue::instance(Rc::clone(class)));
    let this = Value::Object(Rc::clone(&obj));

    let result = match class.constructor() {
        Some(ctor) => call_function(&ctor, Some(this.clone()), args, span, env, ctx),
        None => Ok(Value::Nil),
    };
    obj.finish_init();

    match result? {
        Value::Nil => Ok(this),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn eval(src: &str) -> Result<Value, EvalError> {
        let program = parse(&tokenize(src).unwrap()).unwrap();
        let mut env = Environment::new();
        eval_stmts(&program.stmts, &mut env, &EvalContext::default())
    }

    #[test]
    fn test_call_returns_value() {
        let v = eval("function add(a, b) { return a + b }\nadd(2, 3)").unwrap();
        assert_eq!(v, Value::Number(5.0));
    }

    #[test]
    fn test_falling_off_end_is_nil() {
        assert_eq!(eval("function f() { 1 }\nf()").unwrap(), Value::Nil);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = eval("function f(a) { return a }\nf()").unwrap_err();
        assert!(matches!(
            err,
            EvalError::ArityMismatch { expected: 1, got: 0, .. }
        ));
    }

    #[test]
    fn test_call_non_callable() {
        let err = eval("let x = 1\nx()").unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_constructor_returns_this() {
        let src = "class P {\n var x\n constructor(x) { set this.x = x }\n}\nlet p = P(3)\np.x";
        assert_eq!(eval(src).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_class_without_constructor_takes_no_args() {
        let err = eval("class E {}\nE(1)").unwrap_err();
        assert!(matches!(err, EvalError::ArityMismatch { expected: 0, got: 1, .. }));
    }
}
