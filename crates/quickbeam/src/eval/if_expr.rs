//! If statement and block evaluation

use super::stmt::eval_stmts;
use super::Evaluate;
use crate::ast::{Block, IfStmt};
use crate::stack::ensure_sufficient_stack;
use crate::{Environment, EvalContext, EvalError, Value};

/// Run the first branch whose condition is truthy, or the `else` block.
pub fn eval_if(stmt: &IfStmt, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    for (cond, body) in &stmt.branches {
        if cond.eval(env, ctx)?.is_truthy() {
            return eval_block(body, env, ctx);
        }
    }
    match &stmt.otherwise {
        Some(block) => eval_block(block, env, ctx),
        None => Ok(Value::Nil),
    }
}

/// Evaluate a block in a fresh scope.
pub fn eval_block(block: &Block, env: &mut Environment, ctx: &EvalContext) -> Result<Value, EvalError> {
    ensure_sufficient_stack(|| {
        let mut guard = env.scope_guard();
        eval_stmts(&block.stmts, &mut guard, ctx)
    })
}
