use super::{InternedString, Value};

/// The mapping protocol shared by plain dictionaries and the frame locals proxy.
pub trait Mapping {
    fn get_item(&self, key: &str) -> Option<Value>;

    fn set_item(&mut self, key: InternedString, value: Value);

    /// Removes `key` and returns the value it was bound to.
    fn del_item(&mut self, key: &str) -> Option<Value>;

    fn keys(&self) -> Vec<InternedString>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get_item(key).is_some()
    }
}
