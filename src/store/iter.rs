use super::{Read, Store, KV};
use crate::Result;

/// An iterator over a key range of a [`Store`], built on repeated calls to
/// `get_next`. Keys are yielded in ascending order.
///
/// The iterator borrows the store, so entries must be collected before the
/// store is written to.
pub struct Iter<'a> {
    store: &'a Store,
    cursor: Vec<u8>,
    end: Option<Vec<u8>>,
    done: bool,
}

impl<'a> Iter<'a> {
    /// Creates an iterator which visits keys strictly greater than `start` and
    /// strictly less than `end` (or unbounded if `end` is `None`).
    pub fn new(store: &'a Store, start: Vec<u8>, end: Option<Vec<u8>>) -> Self {
        Iter {
            store,
            cursor: start,
            end,
            done: false,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<KV>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let entry = match self.store.get_next(self.cursor.as_slice()) {
            Ok(entry) => entry,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        match entry {
            Some((key, value)) => {
                if let Some(end) = &self.end {
                    if key.as_slice() >= end.as_slice() {
                        self.done = true;
                        return None;
                    }
                }
                self.cursor = key.clone();
                Some(Ok((key, value)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MapStore, Write};

    fn store() -> Store {
        let mut store = Store::new(MapStore::new());
        for key in [[1, 0], [1, 5], [2, 0], [2, 1], [3, 0]] {
            store.put(key.to_vec(), vec![key[1]]).unwrap();
        }
        store
    }

    #[test]
    fn iter_prefix() {
        let store = store();
        let keys: Vec<_> = store
            .iter_prefix(&[2])
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(keys, vec![vec![2, 0], vec![2, 1]]);
    }

    #[test]
    fn iter_range() {
        let store = store();
        let keys: Vec<_> = store
            .iter_range(vec![1, 0], Some(vec![2, 1]))
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(keys, vec![vec![1, 5], vec![2, 0]]);
    }

    #[test]
    fn iter_sub_store() {
        let store = store().sub(&[1]);
        let entries: Vec<_> = store.iter_prefix(&[]).map(Result::unwrap).collect();
        assert_eq!(entries, vec![(vec![0], vec![0]), (vec![5], vec![5])]);
    }
}
