use std::collections::BTreeMap;

use super::{NestedStore, Store, StoreIter};

/// An in-memory ordered key-value store.
///
/// It serves as the root store of a [`crate::state::State`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.items.get(key).cloned()
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) {
        self.items.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &[u8]) {
        self.items.remove(key);
    }

    fn iter_from(&self, start: &[u8]) -> StoreIter<'_> {
        Box::new(
            self.items
                .range(start.to_vec()..)
                .map(|(key, value)| (key.clone(), value.clone())),
        )
    }
}

impl NestedStore for MemoryStore {
    fn commit(self: Box<Self>) -> Box<dyn NestedStore> {
        panic!("cannot commit the root store");
    }

    fn rollback(self: Box<Self>) -> Box<dyn NestedStore> {
        panic!("cannot rollback the root store");
    }

    fn has_pending_updates(&self) -> bool {
        false
    }
}
