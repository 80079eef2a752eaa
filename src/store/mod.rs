//! Ordered key/value storage.
//!
//! State is kept in an ordered byte-keyed store. Keepers hold a [`Store`]
//! handle, which is a cheap clone of a shared backing store plus a key prefix.
//! Transactions run against a [`BufStore`] layered over the block's buffer so
//! their writes can be flushed on success or dropped on failure.

use crate::Result;

pub mod bufstore;
pub mod iter;
pub mod mapstore;
pub mod share;
#[allow(clippy::module_inception)]
pub mod store;

pub use bufstore::BufStore;
pub use iter::Iter;
pub use mapstore::MapStore;
pub use share::Shared;
pub use store::Store;

/// A key/value entry.
pub type KV = (Vec<u8>, Vec<u8>);

/// Read access to an ordered key/value store.
pub trait Read {
    /// Gets the value stored at `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Gets the first entry whose key is strictly greater than `key`.
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>>;

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Write access to a key/value store.
pub trait Write {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// A store which can be read from and written to, and which can be held
/// behind a shared trait object.
pub trait Backing: Read + Write {}

impl<T: Read + Write> Backing for T {}

/// Returns the smallest key which is greater than every key starting with
/// `prefix`, or `None` if no such key exists (the prefix is all `0xff`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_increments_last_byte() {
        assert_eq!(prefix_end(&[1, 2, 3]), Some(vec![1, 2, 4]));
        assert_eq!(prefix_end(&[1, 255]), Some(vec![2]));
        assert_eq!(prefix_end(&[255, 255]), None);
        assert_eq!(prefix_end(&[]), None);
    }
}
