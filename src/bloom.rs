//! #   The LockFreeBloomFilter.
//!
//! A tiny Bloom filter, fitting in a single atomic word, used as a front-end
//! of the `LockFreeAddressHashSet` so that looking up an absent address rarely
//! needs to walk a bucket.
//!
//! ##  Under the covers.
//!
//! Each key is mapped to a mask of up to `num_hash_functions` bits out of
//! `MAX_BITS`, the `i`-th bit being selected by the `i`-th salted hash of the
//! key. Adding a key ORs its mask into the storage; a key may be present only
//! if all bits of its mask are set.
//!
//! All operations use Relaxed ordering: the filter only guarantees that its
//! bits are read and written atomically, any ordering with respect to other
//! data is up to the caller.
//!
//! Keys cannot be removed individually. Instead, the owner of the filter
//! recomputes the union of the masks of the surviving keys, and replaces the
//! storage wholesale with `atomic_set_bits`.
//!
//! #   Example
//!
//! ```
//! use addrset::address::Address;
//! use addrset::bloom::LockFreeBloomFilter;
//!
//! let filter = LockFreeBloomFilter::new(2);
//! let key = Address::new(0x1000).unwrap();
//!
//! assert!(!filter.maybe_contains(key));
//!
//! filter.add(key);
//! assert!(filter.maybe_contains(key));
//!
//! //  Forget everything.
//! filter.atomic_set_bits(0);
//! assert!(!filter.maybe_contains(key));
//! ```

use std::fmt;

use super::address::Address;
use super::atomic::RelaxedU64;
use super::failure::{panic_from_failure, Failure, Result};
use super::hash::salted_hash;

/// The storage of the filter.
pub type BitStorage = u64;

/// The number of bits of the filter.
pub const MAX_BITS: usize = BitStorage::BITS as usize;

//  Shifting a `BitStorage`, rather than an integer literal, avoids overflows.
const ONE_BIT: BitStorage = 1;

/// `LockFreeBloomFilter`
pub struct LockFreeBloomFilter {
    bits: RelaxedU64,
    num_hash_functions: usize,
    hashing: Hashing,
}

impl LockFreeBloomFilter {
    /// Creates a new, empty, instance applying `num_hash_functions` per key.
    ///
    /// #   Errors
    ///
    /// Returns `Failure::NoHashFunctions` if `num_hash_functions` is 0.
    ///
    /// #   Example
    ///
    /// ```
    /// use addrset::bloom::LockFreeBloomFilter;
    /// use addrset::failure::Failure;
    ///
    /// assert_eq!(Some(Failure::NoHashFunctions), LockFreeBloomFilter::try_new(0).err());
    ///
    /// let filter = LockFreeBloomFilter::try_new(3).unwrap();
    /// assert_eq!(3, filter.num_hash_functions());
    /// assert_eq!(0, filter.bits());
    /// ```
    pub fn try_new(num_hash_functions: usize) -> Result<Self> {
        Self::with_hashing(num_hash_functions, Hashing::Salted)
    }

    /// Creates a new, empty, instance applying `num_hash_functions` per key.
    ///
    /// #   Panics
    ///
    /// Panics if `num_hash_functions` is 0.
    pub fn new(num_hash_functions: usize) -> Self {
        Self::try_new(num_hash_functions).unwrap_or_else(|failure| panic_from_failure(failure))
    }

    /// Returns the number of hash functions applied per key.
    pub fn num_hash_functions(&self) -> usize { self.num_hash_functions }

    /// Returns whether `key` may have been added.
    ///
    /// A `false` answer is definitive, a `true` answer may be a false positive.
    #[inline]
    pub fn maybe_contains(&self, key: Address) -> bool {
        let mask = self.bits_for_key(key);

        (self.bits.load() & mask) == mask
    }

    /// Adds `key`.
    ///
    /// Once this call returns, `maybe_contains(key)` returns `true` on this
    /// thread, and on any thread synchronizing with it.
    #[inline]
    pub fn add(&self, key: Address) {
        let mask = self.bits_for_key(key);

        self.bits.fetch_or(mask);
    }

    /// Replaces all the bits at once.
    ///
    /// Concurrent readers observe either the former or the new bits, never a
    /// mix of both.
    pub fn atomic_set_bits(&self, bits: BitStorage) { self.bits.store(bits); }

    /// Returns the mask of bits set by `key`, without modifying the filter.
    ///
    /// #   Example
    ///
    /// ```
    /// use addrset::address::Address;
    /// use addrset::bloom::LockFreeBloomFilter;
    ///
    /// let filter = LockFreeBloomFilter::new(4);
    /// let mask = filter.bits_for_key(Address::new(0x1000).unwrap());
    ///
    /// assert!(1 <= mask.count_ones() && mask.count_ones() <= 4);
    /// assert_eq!(0, filter.bits());
    /// ```
    #[inline]
    pub fn bits_for_key(&self, key: Address) -> BitStorage {
        let key = key.get();

        (0..self.num_hash_functions)
            .map(|i| self.hashing.hash(key, i))
            .fold(0, |mask, hash| mask | (ONE_BIT << (hash % MAX_BITS as u64)))
    }

    /// Returns the current bits.
    pub fn bits(&self) -> BitStorage { self.bits.load() }

    /// Returns the number of bits currently set.
    ///
    /// The closer to `MAX_BITS`, the more false positives.
    pub fn count_bits(&self) -> usize { self.bits.load().count_ones() as usize }

    //  Creates a new instance, with the specified hashing.
    fn with_hashing(num_hash_functions: usize, hashing: Hashing) -> Result<Self> {
        if num_hash_functions == 0 {
            return Err(Failure::NoHashFunctions);
        }

        Ok(Self { bits: RelaxedU64::new(0), num_hash_functions, hashing })
    }
}

impl fmt::Debug for LockFreeBloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeBloomFilter")
            .field("num_hash_functions", &self.num_hash_functions)
            .field("bits", &format_args!("{:#018x}", self.bits()))
            .finish()
    }
}

//
//  Implementation Details
//

//  The family of hash functions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Hashing {
    //  Proper, independent, hash functions.
    Salted,
    //  Predictable hash functions, for tests: the i-th hash is `key >> i`.
    #[cfg(test)]
    Identity,
}

impl Hashing {
    #[inline(always)]
    fn hash(self, key: usize, i: usize) -> u64 {
        match self {
            Hashing::Salted => salted_hash(key, i),
            #[cfg(test)]
            Hashing::Identity => (key >> i) as u64,
        }
    }
}

#[cfg(test)]
impl LockFreeBloomFilter {
    //  Creates a new instance with predictable bits.
    pub(crate) fn with_identity_hashing(num_hash_functions: usize) -> Self {
        Self::with_hashing(num_hash_functions, Hashing::Identity).unwrap()
    }
}
