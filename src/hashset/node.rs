//! Internal node of the bucket chains.

use std::{array, marker, ptr};

use super::address::{Address, EMPTY};
use super::atomic::RelaxedUsize;

//  A node of a bucket chain.
//
//  Once published, a node is never unlinked, and its `next` pointer never
//  changes: only its key slots are modified.
//
//  Each slot holds either EMPTY, DELETED, or a key. Slots are filled in order,
//  hence an EMPTY slot is only ever followed by EMPTY slots.
pub struct Node<const K: usize> {
    keys: [RelaxedUsize; K],
    next: *mut Node<K>,
}

impl<const K: usize> Node<K> {
    //  Post-monomorphization check that nodes can hold a key.
    const AT_LEAST_ONE_KEY: () = assert!(K >= 1, "a Node must hold at least one key");

    //  Creates a new node, with `key` in its first slot.
    pub fn new(key: Address, next: *mut Node<K>) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::AT_LEAST_ONE_KEY;

        let keys = array::from_fn(|i| RelaxedUsize::new(if i == 0 { key.get() } else { EMPTY }));

        Self { keys, next }
    }

    //  Returns the slots.
    pub fn keys(&self) -> &[RelaxedUsize; K] { &self.keys }

    //  Returns the next node, possibly null.
    pub fn next(&self) -> *mut Node<K> { self.next }

    //  Returns the slot holding `key`, if any.
    #[inline(always)]
    pub fn find(&self, key: Address) -> Option<&RelaxedUsize> {
        self.keys.iter().find(|slot| slot.load() == key.get())
    }
}

//  An iterator over a chain of nodes.
pub struct Chain<'a, const K: usize> {
    node: *const Node<K>,
    _marker: marker::PhantomData<&'a Node<K>>,
}

impl<'a, const K: usize> Chain<'a, K> {
    //  Creates an empty chain.
    pub fn empty() -> Self {
        Self { node: ptr::null(), _marker: marker::PhantomData }
    }

    //  Creates a chain starting at `head`.
    //
    //  #   Safety
    //
    //  -   Assumes that `head` is either null, or points to a fully initialized
    //      node, whose load synchronized with its publication.
    //  -   Assumes that no node of the chain is deallocated for `'a`.
    pub unsafe fn new(head: *const Node<K>) -> Self {
        Self { node: head, _marker: marker::PhantomData }
    }
}

impl<'a, const K: usize> Iterator for Chain<'a, K> {
    type Item = &'a Node<K>;

    fn next(&mut self) -> Option<&'a Node<K>> {
        //  Safety:
        //  -   `self.node` is null or valid for 'a, per construction.
        //  -   `next` was written before its node was published, and any
        //      thread which observed the node also observes `next`.
        let node = unsafe { self.node.as_ref() }?;

        self.node = node.next;
        Some(node)
    }
}
