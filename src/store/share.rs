use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::{Backing, Read, Write, KV};
use crate::Result;

/// A shared reference to a value, allowing several owners to read from and
/// write to it. Used for the backing store behind every [`Store`](super::Store)
/// handle and for the staking hooks.
pub struct Shared<T: ?Sized>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    pub fn new(inner: T) -> Self {
        Shared(Rc::new(RefCell::new(inner)))
    }
}

impl<T: ?Sized> Shared<T> {
    pub fn borrow(&self) -> Ref<T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<T> {
        self.0.borrow_mut()
    }
}

impl<T: Backing + 'static> Shared<T> {
    /// Erases the concrete type of the shared store.
    pub fn into_backing(self) -> Shared<dyn Backing> {
        let inner: Rc<RefCell<dyn Backing>> = self.0;
        Shared(inner)
    }
}

impl<T: ?Sized> From<Rc<RefCell<T>>> for Shared<T> {
    fn from(inner: Rc<RefCell<T>>) -> Self {
        Shared(inner)
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Shared<T> {
        Self(self.0.clone())
    }
}

impl<R: Read + ?Sized> Read for Shared<R> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.0.borrow().get(key)
    }

    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        self.0.borrow().get_next(key)
    }
}

impl<W: Write + ?Sized> Write for Shared<W> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.borrow_mut().put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.borrow_mut().delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MapStore;

    #[test]
    fn share() {
        let mut store = Shared::new(MapStore::new());
        let mut share0 = store.clone();
        let share1 = store.clone();

        share0.put(vec![123], vec![5]).unwrap();
        assert_eq!(store.get(&[123]).unwrap(), Some(vec![5]));
        assert_eq!(share0.get(&[123]).unwrap(), Some(vec![5]));
        assert_eq!(share1.get(&[123]).unwrap(), Some(vec![5]));

        store.put(vec![123], vec![6]).unwrap();
        assert_eq!(share0.get(&[123]).unwrap(), Some(vec![6]));
        assert_eq!(share1.get(&[123]).unwrap(), Some(vec![6]));
    }
}
