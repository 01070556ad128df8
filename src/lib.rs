//  Lints
#![allow(clippy::module_inception)]

//! #   The AddrSet Library
//!
//! The bookkeeping of a sampling heap profiler: which addresses of the heap
//! are currently sampled allocations.
//!
//! -   The `LockFreeAddressHashSet`: a fixed-size hash set of addresses, whose
//!     lookups are lock-free and whose writes are serialized by a lock.
//! -   The `LockFreeBloomFilter`: a single-word Bloom filter, used as an
//!     optional front-end of the set to speed up lookups of absent addresses.
//!
//! Lookups are expected to vastly outnumber writes: every deallocation checks
//! whether its address was sampled, while only sampled allocations are added.

pub mod address;
pub mod allocator;
pub mod bloom;
pub mod config;
pub mod failure;
pub mod hashset;
pub mod lock;

mod utils;

use self::utils::atomic;
use self::utils::hash;
