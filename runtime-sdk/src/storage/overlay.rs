use std::{
    cmp::Ordering,
    collections::{btree_map, BTreeMap},
    iter::Peekable,
};

use super::{NestedStore, Store, StoreIter};

/// A store that buffers all updates in memory until committed into its parent.
///
/// Removals are recorded as `None` so they shadow the parent's entries.
pub struct OverlayStore<S: Store> {
    parent: S,
    updates: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<S: Store> OverlayStore<S> {
    /// Create a new overlay store on top of the given parent.
    pub fn new(parent: S) -> Self {
        Self {
            parent,
            updates: BTreeMap::new(),
        }
    }

    /// Apply all buffered updates to the parent store and return it.
    pub fn commit(mut self) -> S {
        for (key, value) in self.updates {
            match value {
                Some(value) => self.parent.insert(&key, &value),
                None => self.parent.remove(&key),
            }
        }
        self.parent
    }

    /// Discard all buffered updates and return the parent store.
    pub fn rollback(self) -> S {
        self.parent
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}

impl<S: Store> Store for OverlayStore<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.updates.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) {
        self.updates.insert(key.to_owned(), Some(value.to_owned()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.updates.insert(key.to_owned(), None);
    }

    fn iter_from(&self, start: &[u8]) -> StoreIter<'_> {
        Box::new(MergedIter {
            parent: self.parent.iter_from(start).peekable(),
            updates: self.updates.range(start.to_vec()..).peekable(),
        })
    }
}

impl NestedStore for OverlayStore<Box<dyn NestedStore>> {
    fn commit(self: Box<Self>) -> Box<dyn NestedStore> {
        OverlayStore::commit(*self)
    }

    fn rollback(self: Box<Self>) -> Box<dyn NestedStore> {
        OverlayStore::rollback(*self)
    }

    fn has_pending_updates(&self) -> bool {
        OverlayStore::has_pending_updates(self)
    }
}

/// Parent entries merged with the buffered updates, which take precedence on equal keys.
struct MergedIter<'store> {
    parent: Peekable<StoreIter<'store>>,
    updates: Peekable<btree_map::Range<'store, Vec<u8>, Option<Vec<u8>>>>,
}

impl<'store> Iterator for MergedIter<'store> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ordering = match (self.parent.peek(), self.updates.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((parent_key, _)), Some((update_key, _))) => {
                    parent_key.as_slice().cmp(update_key.as_slice())
                }
            };

            match ordering {
                Ordering::Less => return self.parent.next(),
                // Shadowed by the update.
                Ordering::Equal => {
                    self.parent.next();
                }
                Ordering::Greater => {}
            }

            if let Some((key, Some(value))) = self.updates.next() {
                return Some((key.clone(), value.clone()));
            }
        }
    }
}
