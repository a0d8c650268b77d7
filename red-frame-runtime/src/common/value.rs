use std::fmt::{Display, Formatter};
use std::rc::Rc;

use super::{Cell, DictRef, InternedString};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(InternedString),
    Dict(DictRef),
    // Only ever stored in the cell and free variable slots of a frame.
    Cell(Cell),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(l), Bool(r)) => l == r,
            (Number(l), Number(r)) => l == r,
            (String(l), String(r)) => l == r,
            (Dict(l), Dict(r)) => Rc::ptr_eq(l, r),
            (Cell(l), Cell(r)) => l.ptr_eq(r),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Dict(d) => write!(f, "<dict of {}>", d.borrow().len()),
            Value::Cell(c) => match c.get() {
                Some(v) => write!(f, "<cell: {}>", v),
                None => write!(f, "<cell: empty>"),
            },
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(InternedString::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Dict;

    #[test]
    fn dicts_compare_by_identity() {
        let d = Dict::new_ref();
        assert_eq!(Value::Dict(d.clone()), Value::Dict(d));
        assert_ne!(Value::Dict(Dict::new_ref()), Value::Dict(Dict::new_ref()));
    }
}
