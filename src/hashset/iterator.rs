//! Iterators over LockFreeAddressHashSet.

use std::{fmt, slice};

use super::address::Address;
use super::atomic::AcqRelPtr;
use super::node::{Chain, Node};

/// An iterator over the keys of a `LockFreeAddressHashSet`.
///
/// Created by `LockFreeAddressHashSet::iter`, it borrows the lock guard, and
/// therefore always observes a stable set of keys.
pub struct Keys<'a, const K: usize> {
    buckets: slice::Iter<'a, AcqRelPtr<Node<K>>>,
    chain: Chain<'a, K>,
    node: Option<&'a Node<K>>,
    slot: usize,
}

impl<'a, const K: usize> Keys<'a, K> {
    //  Creates an instance.
    //
    //  #   Safety
    //
    //  -   Assumes that the lock of the set is held for `'a`.
    pub(crate) unsafe fn new(buckets: &'a [AcqRelPtr<Node<K>>]) -> Self {
        Self { buckets: buckets.iter(), chain: Chain::empty(), node: None, slot: 0 }
    }
}

impl<'a, const K: usize> Iterator for Keys<'a, K> {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        loop {
            if let Some(node) = self.node {
                while self.slot < K {
                    let value = node.keys()[self.slot].load();
                    self.slot += 1;

                    //  Skips both empty and deleted slots.
                    if let Some(key) = Address::new(value) {
                        return Some(key);
                    }
                }

                self.node = self.chain.next();
                self.slot = 0;
                continue;
            }

            let bucket = self.buckets.next()?;

            //  Safety:
            //  -   The lock is held, hence the head was stored by a thread
            //      which released the lock since.
            //  -   Nodes are never deallocated while the set is borrowed.
            self.chain = unsafe { Chain::new(bucket.load_exclusive()) };
            self.node = self.chain.next();
            self.slot = 0;
        }
    }
}

impl<'a, const K: usize> fmt::Debug for Keys<'a, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys").field("remaining_buckets", &self.buckets.len()).finish()
    }
}
