use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Read, Write, KV};
use crate::Result;

/// A simple in-memory store. This is the committed backing store used by the
/// app and by tests.
#[derive(Default, Clone, Debug)]
pub struct MapStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl MapStore {
    pub fn new() -> MapStore {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Read for MapStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.get(key).cloned())
    }

    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        Ok(self
            .0
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl Write for MapStore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_delete() {
        let mut store = MapStore::new();
        store.put(vec![1, 2, 3], vec![4, 5, 6]).unwrap();
        assert_eq!(store.get(&[1, 2, 3]).unwrap(), Some(vec![4, 5, 6]));

        store.delete(&[1, 2, 3]).unwrap();
        assert_eq!(store.get(&[1, 2, 3]).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn get_next_is_exclusive() {
        let mut store = MapStore::new();
        store.put(vec![1], vec![10]).unwrap();
        store.put(vec![2], vec![20]).unwrap();

        assert_eq!(store.get_next(&[]).unwrap(), Some((vec![1], vec![10])));
        assert_eq!(store.get_next(&[1]).unwrap(), Some((vec![2], vec![20])));
        assert_eq!(store.get_next(&[2]).unwrap(), None);
    }
}
