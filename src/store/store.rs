use super::{prefix_end, Backing, Iter, Read, Shared, Write, KV};
use crate::encoding::{Decode, Encode};
use crate::Result;

/// A handle to a region of a shared backing store. Every key read or written
/// through the handle is prefixed with the handle's prefix, so modules can be
/// given their own namespace with [`Store::sub`].
///
/// Cloning a `Store` is cheap and the clone refers to the same data.
#[derive(Clone)]
pub struct Store {
    prefix: Vec<u8>,
    store: Shared<dyn Backing>,
}

impl Store {
    /// Creates a store handle which owns the given backing store.
    pub fn new<S: Backing + 'static>(inner: S) -> Self {
        Self::from_shared(Shared::new(inner))
    }

    /// Creates a store handle over an existing shared backing store.
    pub fn from_shared<S: Backing + 'static>(inner: Shared<S>) -> Self {
        Store {
            prefix: vec![],
            store: inner.into_backing(),
        }
    }

    /// Returns a handle to the region of this store under `key`.
    #[inline]
    pub fn sub(&self, key: &[u8]) -> Self {
        Store {
            prefix: concat(self.prefix.as_slice(), key),
            store: self.store.clone(),
        }
    }

    /// Reads and decodes the value at `key`.
    pub fn get_decoded<T: Decode>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(T::decode(bytes.as_slice())?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes `value` at `key`.
    pub fn put_encoded<T: Encode>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = value.encode()?;
        self.put(key, bytes)
    }

    /// Iterates over every entry whose key starts with `prefix`, in key order.
    pub fn iter_prefix(&self, prefix: &[u8]) -> Iter<'_> {
        Iter::new(self, prefix.to_vec(), prefix_end(prefix))
    }

    /// Iterates over entries with keys in `[start, end)`, in key order. The
    /// entry exactly at `start` is not visited.
    pub fn iter_range(&self, start: Vec<u8>, end: Option<Vec<u8>>) -> Iter<'_> {
        Iter::new(self, start, end)
    }

    /// Collects every entry under `prefix`, decoding each value.
    pub fn collect_prefix<T: Decode>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, T)>> {
        self.iter_prefix(prefix)
            .map(|entry| {
                let (key, value) = entry?;
                Ok((key, T::decode(value.as_slice())?))
            })
            .collect()
    }
}

impl Read for Store {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.get(prefixed.as_slice())
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        match self.store.get_next(prefixed.as_slice())? {
            Some((key, value)) if key.starts_with(self.prefix.as_slice()) => {
                Ok(Some((key[self.prefix.len()..].to_vec(), value)))
            }
            _ => Ok(None),
        }
    }
}

impl Write for Store {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key.as_slice());
        self.store.put(prefixed, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.delete(prefixed.as_slice())
    }
}

#[inline]
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(a.len() + b.len());
    value.extend_from_slice(a);
    value.extend_from_slice(b);
    value
}
