//! Control flow mechanism for break/continue/return

use crate::Value;

/// Control flow signal for non-local jumps.
///
/// `break`, `continue` and `return` don't produce a normal value. They
/// return `Err(EvalError::ControlFlow(...))`, which propagates up until the
/// enclosing loop or call catches it.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Leave the innermost loop
    Break,

    /// Skip to the next iteration of the innermost loop
    Continue,

    /// Return from a function (or the program) with a value
    Return {
        /// Value to return
        value: Value,
    },
}

impl ControlFlow {
    /// Create a return.
    pub fn return_value(value: Value) -> Self {
        ControlFlow::Return { value }
    }

    /// Value carried out of a function body or program. Stray loop signals
    /// carry nil.
    pub fn into_value(self) -> Value {
        match self {
            ControlFlow::Return { value } => value,
            ControlFlow::Break | ControlFlow::Continue => Value::Nil,
        }
    }

    /// Keyword that produced this signal.
    pub fn keyword(&self) -> &'static str {
        match self {
            ControlFlow::Break => "break",
            ControlFlow::Continue => "continue",
            ControlFlow::Return { .. } => "return",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_value() {
        let ret = ControlFlow::return_value(Value::Number(3.0));
        assert_eq!(ret.keyword(), "return");
        assert_eq!(ret.into_value(), Value::Number(3.0));
        assert_eq!(ControlFlow::Break.into_value(), Value::Nil);
    }
}
