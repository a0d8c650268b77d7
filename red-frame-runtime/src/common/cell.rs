use std::{cell::RefCell, rc::Rc};

use super::Value;

/// A shared box holding a variable captured by a closure.
/// An empty cell represents a variable that has not been assigned yet.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    internal: Rc<RefCell<Option<Value>>>,
}

impl Cell {
    pub fn new(value: Option<Value>) -> Self {
        Self {
            internal: Rc::new(RefCell::new(value)),
        }
    }

    pub fn get(&self) -> Option<Value> {
        self.internal.borrow().clone()
    }

    /// Stores `value` and returns the previous content.
    pub fn set(&self, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut *self.internal.borrow_mut(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.internal.borrow().is_none()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.internal, &other.internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_the_same_content() {
        let cell = Cell::default();
        let shared = cell.clone();
        assert!(shared.is_empty());
        assert_eq!(cell.set(Some(Value::Number(1.0))), None);
        assert_eq!(shared.get(), Some(Value::Number(1.0)));
        assert!(cell.ptr_eq(&shared));
    }
}
