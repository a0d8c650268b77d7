use std::{
    cell::RefCell,
    collections::{hash_map, HashMap, TryReserveError},
    rc::Rc,
};

use super::{InternedString, Mapping, Value};

pub type DictRef = Rc<RefCell<Dict>>;

/// The general purpose mapping used for globals, builtins and dict-scoped locals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: HashMap<InternedString, Value>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_ref() -> DictRef {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: InternedString, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, InternedString, Value> {
        self.entries.iter()
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.entries.try_reserve(additional)
    }
}

impl<K: Into<InternedString>, V: Into<Value>> FromIterator<(K, V)> for Dict {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Mapping for Dict {
    fn get_item(&self, key: &str) -> Option<Value> {
        self.get(key)
    }

    fn set_item(&mut self, key: InternedString, value: Value) {
        self.insert(key, value);
    }

    fn del_item(&mut self, key: &str) -> Option<Value> {
        self.remove(key)
    }

    fn keys(&self) -> Vec<InternedString> {
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
