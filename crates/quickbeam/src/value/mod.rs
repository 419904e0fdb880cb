//! Value representation for runtime values

mod callable;
mod display;
mod impls;
mod list;
mod object;

pub use callable::{ClassValue, FunctionValue};
pub use display::format_number;
pub use list::ListValue;
pub use object::{FieldError, FieldSlot, ObjectValue};

use std::rc::Rc;

/// Runtime value representation for the interpreter.
///
/// Values are organized into two tiers:
/// - Scalars, which are copied on every read
/// - Shared handles (`Rc`), where a read aliases the same instance
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// Absence of a value
    Nil,

    /// Boolean: `true` or `false`
    Bool(bool),

    /// All numbers are 64-bit floats
    Number(f64),

    /// Immutable string
    String(Rc<str>),

    // ═══════════════════════════════════════════════════════════════════
    // Shared Handles
    // ═══════════════════════════════════════════════════════════════════
    /// Function closure
    Function(Rc<FunctionValue>),

    /// Class; calling it constructs an instance
    Class(Rc<ClassValue>),

    /// Class instance or object literal
    Object(Rc<ObjectValue>),

    /// List
    List(Rc<ListValue>),
}
