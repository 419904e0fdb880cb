//! Objects: class instances and object literals

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ClassValue, Value};
use crate::ast::Grade;

/// A field's current value and the privileges it was declared with.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    /// Current value
    pub value: Value,
    /// `var` fields may be reassigned, `mut` fields mutated through
    pub grade: Grade,
}

/// Why a field write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// Class instances cannot grow new fields
    Missing,
    /// The field is not declared `var`
    NotReassignable,
}

/// A class instance or object literal.
///
/// Shared through `Rc`; field storage uses interior mutability so every
/// alias observes writes.
#[derive(Debug)]
pub struct ObjectValue {
    class: Option<Rc<ClassValue>>,
    fields: RefCell<IndexMap<String, FieldSlot>>,
    /// Set while the constructor runs; lifts field write restrictions
    initializing: Cell<bool>,
}

impl ObjectValue {
    /// A fresh instance of `class` with every declared field set to nil.
    pub fn instance(class: Rc<ClassValue>) -> Self {
        let fields = class
            .decl
            .fields
            .iter()
            .map(|field| {
                let slot = FieldSlot {
                    value: Value::Nil,
                    grade: field.grade,
                };
                (field.name.name.clone(), slot)
            })
            .collect();
        Self {
            class: Some(class),
            fields: RefCell::new(fields),
            initializing: Cell::new(true),
        }
    }

    /// An object literal. Its fields carry every privilege.
    pub fn literal(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, value)| {
                let slot = FieldSlot {
                    value,
                    grade: Grade::all(),
                };
                (name, slot)
            })
            .collect();
        Self {
            class: None,
            fields: RefCell::new(fields),
            initializing: Cell::new(false),
        }
    }

    /// The class this object was constructed from.
    pub fn class(&self) -> Option<&Rc<ClassValue>> {
        self.class.as_ref()
    }

    /// Class name, or `object` for literals.
    pub fn type_name(&self) -> String {
        self.class
            .as_ref()
            .map_or_else(|| "object".to_string(), |c| c.name().to_string())
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields.borrow().get(field).map(|slot| slot.value.clone())
    }

    /// Declared privileges of a field.
    pub fn field_grade(&self, field: &str) -> Option<Grade> {
        self.fields.borrow().get(field).map(|slot| slot.grade)
    }

    /// Snapshot of `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.fields
            .borrow()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.value.clone()))
            .collect()
    }

    /// Whether the constructor is still running.
    pub fn is_initializing(&self) -> bool {
        self.initializing.get()
    }

    /// Mark construction as finished.
    pub fn finish_init(&self) {
        self.initializing.set(false);
    }

    /// Write a field, honoring its declared grade.
    pub fn set(&self, field: &str, value: Value) -> Result<(), FieldError> {
        let mut fields = self.fields.borrow_mut();
        match fields.get_mut(field) {
            Some(slot) => {
                if !self.is_initializing() && !slot.grade.contains(Grade::REASSIGN) {
                    return Err(FieldError::NotReassignable);
                }
                slot.value = value;
                Ok(())
            }
            None if self.class.is_some() => Err(FieldError::Missing),
            None => {
                let slot = FieldSlot {
                    value,
                    grade: Grade::all(),
                };
                fields.insert(field.to_string(), slot);
                Ok(())
            }
        }
    }
}
