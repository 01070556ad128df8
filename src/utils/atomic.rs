//! A collection of specialized atomics.
//!
//! In theory, it is perfectly possible to use a mixed of Ordering on the same
//! instance of an Atomic, depending on the situation.
//!
//! In practice, it is the author's experience that this is a rarely needed
//! capability which only makes auditing/reviewing harder.
//!
//! Thus, these little types come with pre-established memory ordering.

use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize, Ordering};

macro_rules! atomic {
    ($name:ident, $underlying:ident, $raw:ident, $load_ordering:expr, $store_ordering:expr) => {
        pub struct $name($underlying);

        impl $name {
            pub fn new(v: $raw) -> Self { Self($underlying::new(v)) }
            pub fn load(&self) -> $raw { self.0.load($load_ordering) }
            pub fn store(&self, v: $raw) { self.0.store(v, $store_ordering); }
        }
    }
}

atomic!{ RelaxedUsize, AtomicUsize, usize, Ordering::Relaxed, Ordering::Relaxed }

atomic!{ RelaxedU64, AtomicU64, u64, Ordering::Relaxed, Ordering::Relaxed }

impl RelaxedU64 {
    //  Sets the bits of `v`, returning the previous value.
    pub fn fetch_or(&self, v: u64) -> u64 { self.0.fetch_or(v, Ordering::Relaxed) }
}

//  A pointer published with Release semantics, and read with Acquire ones.
//
//  Whoever loads a pointer stored by `store` also observes every write which
//  preceeded the `store` on the storing thread, notably the initialization of
//  the pointee.
pub struct AcqRelPtr<T>(AtomicPtr<T>);

impl<T> AcqRelPtr<T> {
    pub fn null() -> Self { Self(AtomicPtr::new(ptr::null_mut())) }
    pub fn load(&self) -> *mut T { self.0.load(Ordering::Acquire) }
    pub fn store(&self, v: *mut T) { self.0.store(v, Ordering::Release); }

    //  Loads the pointer, without synchronization.
    //
    //  Only sound from the single writer thread, or with exclusive access, as
    //  then the last store was sequenced-before the load.
    pub fn load_exclusive(&self) -> *mut T { self.0.load(Ordering::Relaxed) }
}

impl<T> Default for AcqRelPtr<T> {
    fn default() -> Self { Self::null() }
}
