//! The keys of the address set.
//!
//! An `Address` is an opaque, pointer-sized, identifier. It is never
//! dereferenced: the set only ever compares and hashes it.
//!
//! Two values are reserved, and can therefore never be represented by an
//! `Address`:
//!
//! -   `0`, which marks a slot which has never been used.
//! -   `usize::MAX`, which marks a slot whose key has been removed.

use std::fmt;
use std::num::NonZeroUsize;

/// An opaque address, neither null nor `usize::MAX`.
///
/// #   Example
///
/// ```
/// use addrset::address::Address;
///
/// assert!(Address::new(0).is_none());
/// assert!(Address::new(usize::MAX).is_none());
///
/// let address = Address::new(0x1000).unwrap();
/// assert_eq!(0x1000, address.get());
/// ```
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address(NonZeroUsize);

impl Address {
    /// Creates an `Address`, unless `value` is reserved.
    pub const fn new(value: usize) -> Option<Self> {
        if value == DELETED {
            return None;
        }

        match NonZeroUsize::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Creates an `Address` from a pointer, unless it is null.
    ///
    /// #   Example
    ///
    /// ```
    /// use std::ptr;
    /// use addrset::address::Address;
    ///
    /// let value = 42u64;
    ///
    /// assert!(Address::from_ptr(&value).is_some());
    /// assert!(Address::from_ptr(ptr::null::<u64>()).is_none());
    /// ```
    pub fn from_ptr<T>(pointer: *const T) -> Option<Self> {
        Self::new(pointer as usize)
    }

    /// Returns the raw value.
    pub const fn get(self) -> usize { self.0.get() }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.get())
    }
}

//  The value of a slot which never held a key.
pub(crate) const EMPTY: usize = 0;

//  The value of a slot whose key was removed.
pub(crate) const DELETED: usize = usize::MAX;

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn reserved_values() {
    assert_eq!(None, Address::new(EMPTY));
    assert_eq!(None, Address::new(DELETED));

    assert_eq!(Some(1), Address::new(1).map(Address::get));
    assert_eq!(Some(DELETED - 1), Address::new(DELETED - 1).map(Address::get));
}

#[test]
fn from_ptr() {
    let value = [1u8, 2, 3];
    let address = Address::from_ptr(value.as_ptr()).unwrap();

    assert_eq!(value.as_ptr() as usize, address.get());
}

#[test]
fn trait_debug() {
    let address = Address::new(0xbadf00d).unwrap();

    assert_eq!("0xbadf00d", format!("{:?}", address));
}

}
