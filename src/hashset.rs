//! #   The LockFreeAddressHashSet.
//!
//! The `LockFreeAddressHashSet` is a set of addresses, such as the addresses of
//! the sampled allocations of a heap profiler, whose lookups are lock-free
//! while its writes are serialized by an external lock.
//!
//! ##  Under the covers.
//!
//! Under the covers the `LockFreeAddressHashSet` is a fixed-size array of
//! buckets, each bucket being a chain of nodes holding `K` key slots apiece.
//!
//! The main consequences are:
//!
//! -   Once constructed, the number of buckets is fixed: the set never
//!     rehashes, and the chains simply grow longer as keys are added.
//! -   Nodes are never deallocated before the set itself, instead the slots of
//!     removed keys are marked as deleted, and reused by latter insertions.
//! -   A reader walking a chain never observes a partially initialized node,
//!     as nodes are only ever prepended once fully initialized.
//!
//! When constructing a new `LockFreeAddressHashSet`, pay attention to the
//! number of buckets!
//!
//! #   Example: basic
//!
//! Writes require an `AddressLockGuard`, proof that the lock of the set is
//! held, whereas reads do not.
//!
//! ```
//! use std::sync::Arc;
//! use addrset::address::Address;
//! use addrset::hashset::LockFreeAddressHashSet;
//! use addrset::lock::AddressLock;
//!
//! let lock = Arc::new(AddressLock::new());
//! let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(64, lock.clone());
//!
//! let (one, two) = (Address::new(0x1000).unwrap(), Address::new(0x2000).unwrap());
//!
//! {
//!     let guard = lock.lock();
//!     set.insert(&guard, one);
//!     set.insert(&guard, two);
//!
//!     assert_eq!(2, set.size(&guard));
//!
//!     set.remove(&guard, one);
//! }
//!
//! assert!(!set.contains(one));
//! assert!(set.contains(two));
//! ```
//!
//! #   Example: the Bloom filter
//!
//! A set may be created with a Bloom filter, trading a little work on insertion
//! for faster lookups of absent keys. Removed keys are not removed from the
//! filter, which degrades over time unless periodically rebuilt.
//!
//! ```
//! use std::sync::Arc;
//! use addrset::address::Address;
//! use addrset::config::{BloomFilterConfig, HashSetConfig};
//! use addrset::hashset::LockFreeAddressHashSet;
//! use addrset::lock::AddressLock;
//!
//! let lock = Arc::new(AddressLock::new());
//! let config = HashSetConfig::new(64).with_bloom_filter(BloomFilterConfig::new(2));
//! let set: LockFreeAddressHashSet = LockFreeAddressHashSet::with_config(config, lock.clone());
//!
//! let guard = lock.lock();
//!
//! for i in 1..=32 {
//!     set.insert(&guard, Address::new(i * 0x10).unwrap());
//! }
//!
//! for i in 1..=32 {
//!     set.remove(&guard, Address::new(i * 0x10).unwrap());
//! }
//!
//! let filter = set.bloom_filter().unwrap();
//! assert!(filter.count_bits() > 0);
//!
//! set.rebuild_filter(&guard);
//! assert_eq!(0, filter.count_bits());
//! ```
//!
//! #   Example: sharing is caring
//!
//! The core property of `LockFreeAddressHashSet` is its ability to be written
//! to from one thread at a time, while being read from any number of threads,
//! without any reader ever blocking.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use addrset::address::Address;
//! use addrset::hashset::LockFreeAddressHashSet;
//! use addrset::lock::AddressLock;
//!
//! let lock = Arc::new(AddressLock::new());
//! let set: Arc<LockFreeAddressHashSet> = Arc::new(LockFreeAddressHashSet::new(64, lock.clone()));
//!
//! let key = Address::new(0x1000).unwrap();
//! set.insert(&lock.lock(), key);
//!
//! let reader = {
//!     let set = set.clone();
//!     thread::spawn(move || set.contains(key))
//! };
//!
//! assert!(reader.join().unwrap());
//! ```

pub mod iterator;

mod hashset;
mod node;
mod stats;

pub use self::hashset::{ContainsResult, LockFreeAddressHashSet, SingleKeyAddressHashSet};
pub use self::iterator::Keys;
pub use self::stats::BucketStats;

/// The number of keys per node of a `LockFreeAddressHashSet`, by default.
///
/// With 7 keys, a node and its `next` pointer fill a 64 bytes cache line on
/// 64 bits platforms.
pub const KEYS_PER_NODE: usize = 7;

/// The maximum number of buckets of a `LockFreeAddressHashSet`.
///
/// The bucket is selected from a 32 bits hash, additional buckets would never
/// be used.
pub const MAX_BUCKETS_COUNT: u64 = 1 << 32;

use super::address;
use super::allocator;
use super::atomic;
use super::bloom;
use super::config;
use super::failure;
use super::hash;
use super::lock;
