//! Loop evaluation

use super::if_expr::eval_block;
use super::Evaluate;
use crate::ast::WhileStmt;
use crate::eval::control::ControlFlow;
use crate::{Environment, EvalContext, EvalError, Value};

// ═══════════════════════════════════════════════════════════════════════
// while statement
// ═══════════════════════════════════════════════════════════════════════

/// Run the body while the condition is truthy. Each iteration gets a fresh
/// block scope.
pub fn eval_while(
    stmt: &WhileStmt,
    env: &mut Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    loop {
        if !stmt.cond.eval(env, ctx)?.is_truthy() {
            return Ok(Value::Nil);
        }

        match eval_block(&stmt.body, env, ctx) {
            Ok(_) => {}
            Err(EvalError::ControlFlow(cf)) => match cf {
                ControlFlow::Break => return Ok(Value::Nil),
                ControlFlow::Continue => {}
                // Propagate return to the enclosing call
                ControlFlow::Return { .. } => return Err(EvalError::ControlFlow(cf)),
            },
            Err(e) => return Err(e),
        }
    }
}
