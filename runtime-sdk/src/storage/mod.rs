//! Ordered key-value storage backing the chain state.
//!
//! The [`crate::state::State`] keeps a stack of [`OverlayStore`]s on top of a root
//! [`MemoryStore`]. Modules address their data through [`PrefixStore`]s and a [`TypedStore`] for
//! CBOR-encoded values.
mod memory;
mod overlay;
mod prefix;
mod typed;

/// Ordered iterator over the key/value pairs of a store.
pub type StoreIter<'store> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'store>;

/// A key-value store with ordered iteration.
pub trait Store {
    /// Fetch entry with given key.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Update entry with given key to the given value.
    fn insert(&mut self, key: &[u8], value: &[u8]);

    /// Remove entry with given key.
    fn remove(&mut self, key: &[u8]);

    /// Iterate over all entries with a key greater than or equal to `start`, in key order.
    fn iter_from(&self, start: &[u8]) -> StoreIter<'_>;

    /// Iterate over all entries in key order.
    fn iter(&self) -> StoreIter<'_> {
        self.iter_from(&[])
    }
}

/// A store layered on a parent store into which it can be committed.
pub trait NestedStore: Store {
    /// Commit any pending updates into the parent and return the parent store.
    fn commit(self: Box<Self>) -> Box<dyn NestedStore>;

    /// Discard any pending updates and return the parent store.
    fn rollback(self: Box<Self>) -> Box<dyn NestedStore>;

    /// Whether there are any pending updates.
    fn has_pending_updates(&self) -> bool;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        S::get(self, key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) {
        S::insert(self, key, value)
    }

    fn remove(&mut self, key: &[u8]) {
        S::remove(self, key)
    }

    fn iter_from(&self, start: &[u8]) -> StoreIter<'_> {
        S::iter_from(self, start)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        S::get(self, key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) {
        S::insert(self, key, value)
    }

    fn remove(&mut self, key: &[u8]) {
        S::remove(self, key)
    }

    fn iter_from(&self, start: &[u8]) -> StoreIter<'_> {
        S::iter_from(self, start)
    }
}

pub use memory::MemoryStore;
pub use overlay::OverlayStore;
pub use prefix::PrefixStore;
pub use typed::{TypedIter, TypedStore};

#[cfg(test)]
mod test;
