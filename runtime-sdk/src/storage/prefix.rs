use super::{Store, StoreIter};

/// A view of a parent store with all keys under the given prefix.
pub struct PrefixStore<S: Store, P: AsRef<[u8]>> {
    parent: S,
    prefix: P,
}

impl<S: Store, P: AsRef<[u8]>> PrefixStore<S, P> {
    pub fn new(parent: S, prefix: P) -> Self {
        Self { parent, prefix }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        [self.prefix.as_ref(), key].concat()
    }
}

impl<S: Store, P: AsRef<[u8]>> Store for PrefixStore<S, P> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.parent.get(&self.full_key(key))
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) {
        let key = self.full_key(key);
        self.parent.insert(&key, value);
    }

    fn remove(&mut self, key: &[u8]) {
        let key = self.full_key(key);
        self.parent.remove(&key);
    }

    fn iter_from(&self, start: &[u8]) -> StoreIter<'_> {
        let prefix = self.prefix.as_ref();
        Box::new(
            self.parent
                .iter_from(&self.full_key(start))
                .take_while(move |(key, _)| key.starts_with(prefix))
                .map(move |(mut key, value)| (key.split_off(prefix.len()), value)),
        )
    }
}
