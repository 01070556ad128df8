//! The lock serializing writers.
//!
//! The `LockFreeAddressHashSet` does not synchronize its writers: at most one
//! thread may insert or remove at any given time. Rather than trusting the
//! callers to remember to lock, every write operation requires an
//! `AddressLockGuard`, which can only be obtained by locking an `AddressLock`.
//!
//! A single `AddressLock` may be shared by multiple sets, in which case a
//! single guard unlocks all of them.
//!
//! #   Example
//!
//! ```
//! use std::sync::Arc;
//! use addrset::address::Address;
//! use addrset::hashset::LockFreeAddressHashSet;
//! use addrset::lock::AddressLock;
//!
//! let lock = Arc::new(AddressLock::new());
//! let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
//!
//! let key = Address::new(0x1000).unwrap();
//!
//! {
//!     let guard = lock.lock();
//!     set.insert(&guard, key);
//! }
//!
//! //  No lock necessary to read.
//! assert!(set.contains(key));
//! ```
//!
//! #   Example of missing guard.
//!
//! Writing without a guard does not compile.
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use addrset::address::Address;
//! # use addrset::hashset::LockFreeAddressHashSet;
//! # use addrset::lock::AddressLock;
//! let lock = Arc::new(AddressLock::new());
//! let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
//!
//! set.insert(Address::new(0x1000).unwrap());
//! ```
//!
//! #   Example of dangling guard.
//!
//! A guard cannot outlive its lock.
//!
//! ```compile_fail
//! # use addrset::lock::{AddressLock, AddressLockGuard};
//! fn dangling() -> AddressLockGuard<'static> {
//!     let lock = AddressLock::new();
//!     lock.lock()
//! }
//! ```
//!
//! #   Example of foreign guard.
//!
//! A guard of another lock is rejected at run-time.
//!
//! ```should_panic
//! # use std::sync::Arc;
//! # use addrset::address::Address;
//! # use addrset::hashset::LockFreeAddressHashSet;
//! # use addrset::lock::AddressLock;
//! let lock = Arc::new(AddressLock::new());
//! let other = AddressLock::new();
//! let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock);
//!
//! set.insert(&other.lock(), Address::new(0x1000).unwrap());
//! ```

use std::{fmt, ptr};

use parking_lot::{Mutex, MutexGuard};

/// `AddressLock`
///
/// A plain mutual-exclusion lock, whose guard is the writer's token.
#[derive(Default)]
pub struct AddressLock(Mutex<()>);

impl AddressLock {
    /// Creates a new, unlocked, instance.
    pub fn new() -> Self { Self(Mutex::new(())) }

    /// Acquires the lock, blocking until it is available.
    pub fn lock(&self) -> AddressLockGuard<'_> {
        AddressLockGuard { lock: self, _guard: self.0.lock() }
    }

    /// Attempts to acquire the lock, without blocking.
    ///
    /// #   Example
    ///
    /// ```
    /// use addrset::lock::AddressLock;
    ///
    /// let lock = AddressLock::new();
    ///
    /// let guard = lock.try_lock();
    /// assert!(guard.is_some());
    /// assert!(lock.try_lock().is_none());
    /// ```
    pub fn try_lock(&self) -> Option<AddressLockGuard<'_>> {
        self.0.try_lock().map(|guard| AddressLockGuard { lock: self, _guard: guard })
    }

    /// Returns whether the lock is currently held, by any thread.
    pub fn is_locked(&self) -> bool { self.0.is_locked() }
}

impl fmt::Debug for AddressLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressLock").field("locked", &self.is_locked()).finish()
    }
}

/// `AddressLockGuard`
///
/// Proof that an `AddressLock` is held; the lock is released on drop.
pub struct AddressLockGuard<'a> {
    lock: &'a AddressLock,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> AddressLockGuard<'a> {
    /// Returns whether this guard holds `lock`.
    pub fn is_guarding(&self, lock: &AddressLock) -> bool {
        ptr::eq(self.lock, lock)
    }
}

impl<'a> fmt::Debug for AddressLockGuard<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressLockGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn lock_unlock() {
    let lock = AddressLock::new();
    assert!(!lock.is_locked());

    let guard = lock.lock();
    assert!(lock.is_locked());
    assert!(lock.try_lock().is_none());

    drop(guard);
    assert!(!lock.is_locked());
    assert!(lock.try_lock().is_some());
}

#[test]
fn is_guarding() {
    let lock = AddressLock::new();
    let other = AddressLock::new();

    let guard = lock.lock();

    assert!(guard.is_guarding(&lock));
    assert!(!guard.is_guarding(&other));
}

#[test]
fn trait_debug() {
    let lock = AddressLock::new();
    assert_eq!("AddressLock { locked: false }", format!("{:?}", lock));

    let guard = lock.lock();
    assert_eq!("AddressLock { locked: true }", format!("{:?}", lock));
    assert_eq!("AddressLockGuard { .. }", format!("{:?}", guard));
}

}
