use std::{borrow::Borrow, cell::RefCell, collections::HashSet, fmt::Display, sync::Arc};

// A string that is allocated once per thread and shared afterwards.
// Errors carry these, and anyhow needs them to be Send + Sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternedString(Arc<str>);

thread_local! {
    static REGISTRY: RefCell<HashSet<InternedString>> = RefCell::new(HashSet::new());
}

impl InternedString {
    pub fn new(s: &str) -> Self {
        REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();
            registry.get(s).cloned().unwrap_or_else(|| {
                let interned = InternedString(Arc::from(s));
                registry.insert(interned.clone());
                interned
            })
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when both names share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<&str> for InternedString {
    fn from(s: &str) -> Self {
        InternedString::new(s)
    }
}

impl Borrow<str> for InternedString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for InternedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for InternedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}
