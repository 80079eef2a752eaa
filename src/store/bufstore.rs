use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Read, Write, KV};
use crate::Result;

/// An in-memory map containing values modified by writes to a `BufStore`.
/// `None` values mark deletions.
pub type Map = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Wraps a store and records mutations in an in-memory map, so that
/// modifications do not affect the underlying store until `flush` is called.
///
/// Dropping a `BufStore` without flushing discards every write made through
/// it, which is how a failed transaction is rolled back.
pub struct BufStore<S> {
    map: Map,
    store: S,
}

impl<S: Default> Default for BufStore<S> {
    fn default() -> Self {
        Self {
            map: Default::default(),
            store: Default::default(),
        }
    }
}

impl<S> BufStore<S> {
    /// Constructs a `BufStore` by wrapping the given store.
    ///
    /// Calls to get will first check the `BufStore` map, and if no entry is
    /// found will be passed to the underlying store.
    pub fn wrap(store: S) -> Self {
        BufStore {
            store,
            map: Default::default(),
        }
    }

    /// Number of buffered writes (puts and deletes) not yet flushed.
    pub fn pending(&self) -> usize {
        self.map.len()
    }
}

impl<S: Write> BufStore<S> {
    /// Writes all buffered values to the underlying store, leaving the buffer
    /// empty.
    pub fn flush(&mut self) -> Result<()> {
        while let Some((key, value)) = self.map.pop_first() {
            match value {
                Some(value) => self.store.put(key, value)?,
                None => self.store.delete(key.as_slice())?,
            }
        }
        Ok(())
    }
}

impl<S: Read> Read for BufStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.map.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.store.get(key),
        }
    }

    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        let mut map_iter = self
            .map
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded));
        let mut map_entry = map_iter.next();
        let mut backing_entry = self.store.get_next(key)?;

        loop {
            match (map_entry, backing_entry.take()) {
                // consumed both, end here
                (None, None) => return Ok(None),

                // only map values remain, skip deletes
                (Some((key, value)), None) => match value {
                    Some(value) => return Ok(Some((key.clone(), value.clone()))),
                    None => map_entry = map_iter.next(),
                },

                // only backing values remain
                (None, Some(entry)) => return Ok(Some(entry)),

                (Some((map_key, map_value)), Some(entry)) => {
                    match map_key.as_slice().cmp(entry.0.as_slice()) {
                        // backing entry comes first and is not shadowed
                        Ordering::Greater => return Ok(Some(entry)),

                        // map entry comes first
                        Ordering::Less => match map_value {
                            Some(value) => return Ok(Some((map_key.clone(), value.clone()))),
                            None => {
                                map_entry = map_iter.next();
                                backing_entry = Some(entry);
                            }
                        },

                        // map entry shadows backing entry
                        Ordering::Equal => match map_value {
                            Some(value) => return Ok(Some((map_key.clone(), value.clone()))),
                            None => {
                                map_entry = map_iter.next();
                                backing_entry = self.store.get_next(entry.0.as_slice())?;
                            }
                        },
                    }
                }
            }
        }
    }
}

impl<S> Write for BufStore<S> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.map.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.insert(key.to_vec(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MapStore;

    fn collect<S: Read>(store: &S) -> Vec<KV> {
        let mut entries = vec![];
        let mut key = vec![];
        while let Some(entry) = store.get_next(&key).unwrap() {
            key = entry.0.clone();
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn get_slice() {
        let mut store: BufStore<MapStore> = Default::default();
        store.put(vec![1, 2, 3], vec![4, 5, 6]).unwrap();
        assert_eq!(store.get(&[1, 2, 3]).unwrap(), Some(vec![4, 5, 6]));
    }

    #[test]
    fn delete_shadows_backing() {
        let mut backing = MapStore::new();
        backing.put(vec![1, 2, 3], vec![4, 5, 6]).unwrap();

        let mut store = BufStore::wrap(backing);
        store.delete(&[1, 2, 3]).unwrap();
        assert_eq!(store.get(&[1, 2, 3]).unwrap(), None);
    }

    #[test]
    fn merged_iteration() {
        let mut backing = MapStore::new();
        backing.put(vec![0], vec![0]).unwrap();
        backing.put(vec![1], vec![0]).unwrap();
        backing.put(vec![2], vec![0]).unwrap();
        backing.put(vec![4], vec![0]).unwrap();

        let mut buf = BufStore::wrap(backing);
        buf.put(vec![1], vec![1]).unwrap();
        buf.delete(&[2]).unwrap();
        buf.put(vec![3], vec![1]).unwrap();
        buf.delete(&[5]).unwrap();

        assert_eq!(
            collect(&buf),
            vec![
                (vec![0], vec![0]),
                (vec![1], vec![1]),
                (vec![3], vec![1]),
                (vec![4], vec![0]),
            ]
        );
    }

    #[test]
    fn flush_writes_through() {
        let mut buf = BufStore::wrap(MapStore::new());
        buf.put(vec![1], vec![1]).unwrap();
        buf.put(vec![2], vec![2]).unwrap();
        buf.delete(&[2]).unwrap();
        assert_eq!(buf.pending(), 2);

        buf.flush().unwrap();
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.store.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(buf.store.get(&[2]).unwrap(), None);
    }
}
