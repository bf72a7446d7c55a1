use std::{convert::TryFrom, fmt::Display, marker::PhantomData};

use super::{Store, StoreIter};

/// A store of CBOR-encoded values.
///
/// Undecodable entries indicate corrupted state and cause a panic.
pub struct TypedStore<S: Store> {
    parent: S,
}

impl<S: Store> TypedStore<S> {
    pub fn new(parent: S) -> Self {
        Self { parent }
    }

    pub fn get<K: AsRef<[u8]>, T: cbor::Decode>(&self, key: K) -> Option<T> {
        self.parent.get(key.as_ref()).map(|data| decode_value(&data))
    }

    pub fn insert<K: AsRef<[u8]>, T: cbor::Encode>(&mut self, key: K, value: T) {
        self.parent.insert(key.as_ref(), &cbor::to_vec(value))
    }

    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) {
        self.parent.remove(key.as_ref())
    }

    /// Iterate over all entries in key order, decoding keys via `TryFrom<&[u8]>`.
    pub fn iter<K, V>(&self) -> TypedIter<'_, K, V>
    where
        K: for<'k> TryFrom<&'k [u8]>,
        V: cbor::Decode,
    {
        TypedIter {
            inner: self.parent.iter(),
            _entry: PhantomData,
        }
    }
}

/// Iterator over the decoded entries of a [`TypedStore`].
pub struct TypedIter<'store, K, V> {
    inner: StoreIter<'store>,
    _entry: PhantomData<(K, V)>,
}

impl<'store, K, V, E> Iterator for TypedIter<'store, K, V>
where
    K: for<'k> TryFrom<&'k [u8], Error = E>,
    E: Display,
    V: cbor::Decode,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.next()?;
        let key = K::try_from(key.as_slice())
            .unwrap_or_else(|err| panic!("corrupted storage key: {}", err));
        Some((key, decode_value(&value)))
    }
}

fn decode_value<T: cbor::Decode>(data: &[u8]) -> T {
    cbor::from_slice(data).unwrap_or_else(|err| panic!("corrupted storage value: {}", err))
}
