//! Runtime environment managing variable, function and class bindings

mod frame;

pub use frame::{CallFrame, ScopeGuard};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Grade;
use crate::error::EnvironmentError;
use crate::value::Value;

/// A single variable, function or class binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The binding's name
    pub name: String,

    /// The bound value
    pub value: Value,

    /// Privileges the binding was declared with
    pub grade: Grade,
}

/// One lexical scope.
///
/// Scopes form a parent chain. A closure keeps its defining scope alive by
/// holding an `Rc` to it, so bindings added to that scope later (hoisted
/// siblings, later `let`s) are visible to the closure as well.
#[derive(Default)]
pub struct Scope {
    bindings: RefCell<Vec<Binding>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// A root scope with no parent.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A fresh scope nested in `parent`.
    pub fn child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(Vec::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Add a binding to this scope. Shadows an earlier binding of the same name.
    pub fn define(&self, binding: Binding) {
        self.bindings.borrow_mut().push(binding);
    }

    /// Look up a binding here or in an enclosing scope.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(b) = current.bindings.borrow().iter().rev().find(|b| b.name == name) {
                return Some(b.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Replace the value of the nearest binding of `name`.
    ///
    /// Returns `false` when no scope in the chain binds it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut bindings = current.bindings.borrow_mut();
            if let Some(b) = bindings.iter_mut().rev().find(|b| b.name == name) {
                b.value = value;
                return true;
            }
            drop(bindings);
            scope = current.parent.as_deref();
        }
        false
    }

    /// Remove the nearest binding of `name` from the chain.
    pub fn remove(&self, name: &str) -> Option<Binding> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let mut bindings = current.bindings.borrow_mut();
            if let Some(pos) = bindings.iter().rposition(|b| b.name == name) {
                return Some(bindings.remove(pos));
            }
            drop(bindings);
            scope = current.parent.as_deref();
        }
        None
    }

    /// Number of bindings in this scope alone.
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Whether this scope alone has no bindings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .bindings
            .borrow()
            .iter()
            .map(|b| b.name.clone())
            .collect();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// The runtime environment.
///
/// Tracks the innermost scope and the call depth. Block scopes are pushed
/// and popped around the current one; calls swap in a scope nested in the
/// callee's closure (see [`CallFrame`]).
///
/// # Example
///
/// ```
/// use quickbeam::{Environment, Value};
///
/// let mut env = Environment::new();
///
/// // Global scope
/// env.define("x", Value::Number(1.0));
///
/// // Enter a new scope
/// env.push_frame();
/// env.define("y", Value::Number(2.0));
/// env.define("x", Value::Number(10.0)); // Shadows outer x
///
/// assert_eq!(env.get("x"), Some(Value::Number(10.0)));
/// assert_eq!(env.get("y"), Some(Value::Number(2.0)));
///
/// // Exit scope
/// env.pop_frame();
///
/// assert_eq!(env.get("x"), Some(Value::Number(1.0)));
/// assert_eq!(env.get("y"), None);
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    /// Innermost scope
    current: Rc<Scope>,

    /// Current call depth (for recursion limiting)
    call_depth: usize,

    /// Maximum allowed call depth
    max_call_depth: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self::with_max_call_depth(1000)
    }

    /// Create an environment with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            current: Scope::root(),
            call_depth: 0,
            max_call_depth: max_depth,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management (Scope Entry/Exit)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new block scope.
    pub fn push_frame(&mut self) {
        self.current = Scope::child(&self.current);
    }

    /// Exit the current block scope.
    ///
    /// Does nothing at the root scope. Closures that captured the popped
    /// scope keep it alive.
    pub fn pop_frame(&mut self) {
        if let Some(parent) = self.current.parent.clone() {
            self.current = parent;
        }
    }

    /// Number of scopes between the current one and the root, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.current.parent.as_deref();
        while let Some(s) = scope {
            depth += 1;
            scope = s.parent.as_deref();
        }
        depth
    }

    /// Check if we're at the root scope.
    pub fn is_global_scope(&self) -> bool {
        self.current.parent.is_none()
    }

    /// The innermost scope, for closures to capture.
    pub fn current_scope(&self) -> Rc<Scope> {
        Rc::clone(&self.current)
    }

    /// Install `scope` as the innermost scope, returning the previous one.
    pub(crate) fn replace_scope(&mut self, scope: Rc<Scope>) -> Rc<Scope> {
        std::mem::replace(&mut self.current, scope)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Depth Tracking (Stack Overflow Protection)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a function call. Returns error if max depth exceeded.
    pub fn enter_call(&mut self) -> Result<(), EnvironmentError> {
        if self.call_depth >= self.max_call_depth {
            return Err(EnvironmentError::StackOverflow {
                depth: self.call_depth,
                max: self.max_call_depth,
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Exit a function call.
    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Get current call depth.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Configured call depth limit.
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding Definition
    // ═══════════════════════════════════════════════════════════════════

    /// Define a binding without privileges in the current scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.define_with_grade(name, value, Grade::empty());
    }

    /// Define a binding with explicit privileges.
    pub fn define_with_grade(&mut self, name: impl Into<String>, value: Value, grade: Grade) {
        self.current.define(Binding {
            name: name.into(),
            value,
            grade,
        });
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding Lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.current.lookup(name).map(|b| b.value)
    }

    /// Look up the full binding by name.
    pub fn get_binding(&self, name: &str) -> Option<Binding> {
        self.current.lookup(name)
    }

    /// Check if a name is bound in any visible scope.
    pub fn contains(&self, name: &str) -> bool {
        self.current.lookup(name).is_some()
    }

    /// Replace the value of the nearest binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EnvironmentError> {
        if self.current.assign(name, value) {
            Ok(())
        } else {
            Err(EnvironmentError::UndefinedVariable {
                name: name.to_string(),
            })
        }
    }

    /// Drop the nearest binding of `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Result<Value, EnvironmentError> {
        self.current
            .remove(name)
            .map(|b| b.value)
            .ok_or_else(|| EnvironmentError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x", Value::Number(42.0));
        assert_eq!(env.get("x"), Some(Value::Number(42.0)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_pop_frame_never_pops_root() {
        let mut env = Environment::new();
        env.pop_frame();
        assert!(env.is_global_scope());
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));
        env.push_frame();
        env.assign("x", Value::Number(2.0)).unwrap();
        env.pop_frame();
        assert_eq!(env.get("x"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_assign_undefined() {
        let mut env = Environment::new();
        let err = env.assign("nope", Value::Nil).unwrap_err();
        assert_eq!(
            err,
            EnvironmentError::UndefinedVariable {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_call_depth_limit() {
        let mut env = Environment::with_max_call_depth(2);
        env.enter_call().unwrap();
        env.enter_call().unwrap();
        assert!(matches!(
            env.enter_call(),
            Err(EnvironmentError::StackOverflow { depth: 2, max: 2 })
        ));
        env.exit_call();
        assert_eq!(env.call_depth(), 1);
    }

    #[test]
    fn test_captured_scope_sees_later_bindings() {
        let mut env = Environment::new();
        let captured = env.current_scope();
        env.define("late", Value::Bool(true));
        assert!(captured.lookup("late").is_some());
    }

    #[test]
    fn test_grade_is_recorded() {
        let mut env = Environment::new();
        env.define_with_grade("v", Value::Nil, Grade::REASSIGN);
        assert_eq!(env.get_binding("v").unwrap().grade, Grade::REASSIGN);
    }
}
