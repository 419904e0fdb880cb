//! RAII guards for block scopes and call frames

use std::rc::Rc;

use super::{Environment, Scope};
use crate::error::EnvironmentError;

/// RAII guard that automatically pops a block scope when dropped.
///
/// # Example
///
/// ```
/// use quickbeam::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("x", Value::Number(1.0));
///
/// {
///     let mut guard = env.scope_guard();
///     guard.define("y", Value::Number(2.0));
/// }
/// assert!(!env.contains("y"));
/// assert!(env.contains("x"));
/// ```
pub struct ScopeGuard<'a> {
    env: &'a mut Environment,
}

impl Environment {
    /// Create a scope guard that pushes a frame now and pops it on drop.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_> {
        self.push_frame();
        ScopeGuard { env: self }
    }

    /// Enter a call whose body runs in a fresh scope nested in `closure`.
    ///
    /// Fails with a stack overflow when the call depth limit is reached.
    /// The caller's scope is restored when the frame drops.
    pub fn call_frame(&mut self, closure: &Rc<Scope>) -> Result<CallFrame<'_>, EnvironmentError> {
        self.enter_call()?;
        let saved = self.replace_scope(Scope::child(closure));
        Ok(CallFrame {
            env: self,
            saved: Some(saved),
        })
    }
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.env.pop_frame();
    }
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}

/// RAII guard for a function call: restores the caller's scope and call
/// depth when dropped.
pub struct CallFrame<'a> {
    env: &'a mut Environment,
    saved: Option<Rc<Scope>>,
}

impl<'a> Drop for CallFrame<'a> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.env.replace_scope(saved);
        }
        self.env.exit_call();
    }
}

impl<'a> std::ops::Deref for CallFrame<'a> {
    type Target = Environment;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl<'a> std::ops::DerefMut for CallFrame<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_scope_guard_drops_frame() {
        let mut env = Environment::new();
        let initial_depth = env.depth();

        {
            let guard = env.scope_guard();
            assert_eq!(guard.depth(), initial_depth + 1);
        }
        assert_eq!(env.depth(), initial_depth);
    }

    #[test]
    fn test_scope_guard_nested_scopes() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));

        {
            let mut guard1 = env.scope_guard();
            guard1.define("b", Value::Number(2.0));

            {
                let mut guard2 = guard1.scope_guard();
                guard2.define("c", Value::Number(3.0));
                assert!(guard2.contains("a"));
                assert!(guard2.contains("b"));
                assert!(guard2.contains("c"));
            }

            assert!(guard1.contains("b"));
            assert!(!guard1.contains("c"));
        }

        assert!(env.contains("a"));
        assert!(!env.contains("b"));
    }

    #[test]
    fn test_scope_guard_shadows_outer_variable() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));

        {
            let mut guard = env.scope_guard();
            guard.define("x", Value::Number(2.0));
            assert_eq!(guard.get("x"), Some(Value::Number(2.0)));
        }

        assert_eq!(env.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_call_frame_uses_closure_scope() {
        let mut env = Environment::new();
        env.define("global", Value::Number(1.0));
        let closure = env.current_scope();

        env.push_frame();
        env.define("caller_local", Value::Number(2.0));
        {
            let mut frame = env.call_frame(&closure).unwrap();
            frame.define("param", Value::Number(3.0));
            assert!(frame.contains("global"));
            assert!(frame.contains("param"));
            assert!(!frame.contains("caller_local"));
            assert_eq!(frame.call_depth(), 1);
        }
        assert!(env.contains("caller_local"));
        assert!(!env.contains("param"));
        assert_eq!(env.call_depth(), 0);
    }

    #[test]
    fn test_call_frame_overflow_leaves_scope_untouched() {
        let mut env = Environment::with_max_call_depth(0);
        let closure = env.current_scope();
        env.define("x", Value::Nil);
        assert!(env.call_frame(&closure).is_err());
        assert!(env.contains("x"));
        assert_eq!(env.call_depth(), 0);
    }
}
