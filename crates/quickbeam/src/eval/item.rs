//! Function and class declarations

use std::rc::Rc;

use crate::ast::{ClassDecl, FunctionDecl, Stmt};
use crate::value::{ClassValue, FunctionValue};
use crate::{Environment, Value};

/// Bind every function and class declared directly in `stmts` in the
/// current scope.
pub fn hoist_declarations(stmts: &[Stmt], env: &mut Environment) {
    for stmt in stmts {
        match stmt {
            Stmt::Function(decl) => define_function(decl, env),
            Stmt::Class(decl) => define_class(decl, env),
            _ => {}
        }
    }
}

/// Bind a function closing over the current scope.
pub fn define_function(decl: &Rc<FunctionDecl>, env: &mut Environment) {
    let func = FunctionValue::new(Rc::clone(decl), env.current_scope());
    tracing::trace!(function = func.name(), "defined function");
    env.define(decl.name.name.clone(), Value::Function(Rc::new(func)));
}

/// Bind a class whose methods close over the current scope.
pub fn define_class(decl: &Rc<ClassDecl>, env: &mut Environment) {
    let class = ClassValue::new(Rc::clone(decl), env.current_scope());
    tracing::trace!(class = class.name(), methods = class.methods.len(), "defined class");
    env.define(decl.name.name.clone(), Value::Class(Rc::new(class)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    #[test]
    fn test_hoists_functions_and_classes() {
        let program = parse(&tokenize("print f()\nfunction f() { return 1 }\nclass C {}").unwrap()).unwrap();
        let mut env = Environment::new();
        hoist_declarations(&program.stmts, &mut env);
        assert!(matches!(env.get("f"), Some(Value::Function(_))));
        assert!(matches!(env.get("C"), Some(Value::Class(_))));
    }
}
