//! Lists: ordered, shared sequences of values

use std::cell::RefCell;

use super::Value;

/// A list literal or the result of list concatenation.
///
/// Shared through `Rc` like objects; element storage uses interior
/// mutability so every alias observes `set xs[i] = ...`.
#[derive(Debug, Default)]
pub struct ListValue {
    items: RefCell<Vec<Value>>,
}

impl ListValue {
    /// A list holding `items`.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: RefCell::new(items),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.borrow().get(index).cloned()
    }

    /// Replace the element at `index`. Returns `false` when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the elements.
    pub fn items(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    /// A new list with the elements of `self` followed by those of `other`.
    /// Shared elements stay shared.
    pub fn concat(&self, other: &ListValue) -> ListValue {
        let mut items = self.items();
        items.extend(other.items.borrow().iter().cloned());
        ListValue::new(items)
    }
}
