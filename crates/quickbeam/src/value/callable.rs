//! Callable value types: functions and classes

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{ClassDecl, FunctionDecl};
use crate::environment::Scope;

/// A function together with the scope it was declared in.
///
/// Stores the AST directly for interpretation.
#[derive(Clone)]
pub struct FunctionValue {
    /// The declaration (shared with the syntax tree)
    pub decl: Rc<FunctionDecl>,

    /// Scope the function captured at declaration
    pub closure: Rc<Scope>,
}

impl FunctionValue {
    /// Create a new function value
    pub fn new(decl: Rc<FunctionDecl>, closure: Rc<Scope>) -> Self {
        Self { decl, closure }
    }

    /// Declared name.
    pub fn name(&self) -> &str {
        &self.decl.name.name
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({}/{})", self.name(), self.arity())
    }
}

/// A class: field layout, constructor and method table.
#[derive(Clone)]
pub struct ClassValue {
    /// The declaration (shared with the syntax tree)
    pub decl: Rc<ClassDecl>,

    /// Methods by name, in declaration order
    pub methods: IndexMap<String, Rc<FunctionDecl>>,

    /// Scope methods and the constructor close over
    pub closure: Rc<Scope>,
}

impl ClassValue {
    /// Build the method table for `decl`.
    pub fn new(decl: Rc<ClassDecl>, closure: Rc<Scope>) -> Self {
        let methods = decl
            .methods
            .iter()
            .map(|m| (m.name.name.clone(), Rc::clone(m)))
            .collect();
        Self {
            decl,
            methods,
            closure,
        }
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.decl.name.name
    }

    /// Number of constructor parameters (0 without a constructor).
    pub fn arity(&self) -> usize {
        self.decl
            .constructor
            .as_ref()
            .map_or(0, |ctor| ctor.params.len())
    }

    /// Look up a method and close it over the class scope.
    pub fn method(&self, name: &str) -> Option<FunctionValue> {
        self.methods
            .get(name)
            .map(|decl| FunctionValue::new(Rc::clone(decl), Rc::clone(&self.closure)))
    }

    /// The constructor as a callable, if declared.
    pub fn constructor(&self) -> Option<FunctionValue> {
        self.decl
            .constructor
            .as_ref()
            .map(|decl| FunctionValue::new(Rc::clone(decl), Rc::clone(&self.closure)))
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassValue")
            .field("name", &self.name())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
