//! Statement evaluation

use super::control::ControlFlow;
use super::{assign, if_expr, item, loops, Evaluate};
use crate::ast::Stmt;
use crate::{Environment, EvalContext, EvalError, Value};

impl Evaluate for Stmt {
    fn eval(&self, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
        match self {
            Stmt::Let(stmt) => {
                let value = match &stmt.init {
                    Some(init) => init.eval(env, ctx)?,
                    None => Value::Nil,
                };
                env.define_with_grade(stmt.name.name.clone(), value, stmt.grade);
                Ok(Value::Nil)
            }
            Stmt::Set(stmt) => {
                assign::eval_set(stmt, env, ctx)?;
                Ok(Value::Nil)
            }
            // Bound when the enclosing block was entered
            Stmt::Function(_) | Stmt::Class(_) => Ok(Value::Nil),
            Stmt::If(stmt) => if_expr::eval_if(stmt, env, ctx),
            Stmt::While(stmt) => loops::eval_while(stmt, env, ctx),
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => expr.eval(env, ctx)?,
                    None => Value::Nil,
                };
                Err(EvalError::ControlFlow(ControlFlow::return_value(value)))
            }
            Stmt::Break(_) => Err(EvalError::ControlFlow(ControlFlow::Break)),
            Stmt::Continue(_) => Err(EvalError::ControlFlow(ControlFlow::Continue)),
            Stmt::Print { value, .. } => {
                let value = value.eval(env, ctx)?;
                ctx.print(&value.to_string());
                Ok(Value::Nil)
            }
            Stmt::Delete { name, .. } => {
                env.remove(&name.name).map_err(|e| e.at(name.span))?;
                tracing::trace!(name = %name.name, "binding deleted");
                Ok(Value::Nil)
            }
            Stmt::Expr(expr) => expr.eval(env, ctx),
        }
    }
}

/// Evaluate a statement list in the current scope.
///
/// Function and class declarations are bound first, so they can be called
/// before their textual position. Yields the value of the last statement
/// when it is an expression statement, nil otherwise.
pub fn eval_stmts(
    stmts: &[Stmt],
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    item::hoist_declarations(stmts, env);

    let mut last = Value::Nil;
    for stmt in stmts {
        let value = stmt.eval(env, ctx)?;
        last = match stmt {
            Stmt::Expr(_) => value,
            _ => Value::Nil,
        };
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn run_stmts(src: &str) -> Result<Value, EvalError> {
        let tokens = tokenize(src).unwrap();
        let program = parse(&tokens).unwrap();
        let mut env = Environment::new();
        eval_stmts(&program.stmts, &mut env, &EvalContext::default())
    }

    #[test]
    fn test_last_expression_is_value() {
        assert_eq!(run_stmts("let x = 2\nx").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_trailing_declaration_yields_nil() {
        assert_eq!(run_stmts("1\nlet y = 2").unwrap(), Value::Nil);
    }

    #[test]
    fn test_var_without_initializer_is_nil() {
        assert_eq!(run_stmts("var x\nx").unwrap(), Value::Nil);
    }

    #[test]
    fn test_delete_removes_binding() {
        let err = run_stmts("let x = 1\ndelete x\nx").unwrap_err();
        assert!(matches!(err, EvalError::UnboundName { ref name, .. } if name == "x"));
    }

    #[test]
    fn test_return_propagates_as_control_flow() {
        let err = run_stmts("return 4").unwrap_err();
        assert!(matches!(
            err,
            EvalError::ControlFlow(ControlFlow::Return { value: Value::Number(n) }) if n == 4.0
        ));
    }
}
