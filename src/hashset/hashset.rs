//! The LockFreeAddressHashSet

use std::{alloc, fmt, ptr};
use std::sync::Arc;

use tracing::debug;

use super::address::{Address, DELETED, EMPTY};
use super::allocator::{Allocator, DefaultAllocator, Layout};
use super::atomic::{AcqRelPtr, RelaxedUsize};
use super::bloom::{BitStorage, LockFreeBloomFilter};
use super::config::{BloomFilterConfig, HashSetConfig};
use super::failure::{panic_from_failure, Failure, Result};
use super::hash::address_hash;
use super::iterator::Keys;
use super::lock::{AddressLock, AddressLockGuard};
use super::node::{Chain, Node};
use super::stats::{chi_squared, BucketStats};
use super::{KEYS_PER_NODE, MAX_BUCKETS_COUNT};

//
//  Public Interface
//

/// The outcome of `LockFreeAddressHashSet::lookup`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContainsResult {
    /// The key is in the set, and in the Bloom filter if any.
    Found,
    /// The key is not in the set, nor in the Bloom filter if any.
    NotFound,
    /// The key matched the Bloom filter, but is not in the set: a false
    /// positive of the Bloom filter.
    NotFoundButMatchedInBloomFilter,
}

impl ContainsResult {
    /// Returns whether the key was found.
    pub fn is_found(self) -> bool { self == ContainsResult::Found }
}

/// `LockFreeAddressHashSet`
///
/// A set of addresses with a fixed number of buckets, whose `contains` is
/// lock-free, and whose writes are serialized by an `AddressLock`.
///
/// `K` is the number of keys per node; 1 for a traditional chained hash set.
pub struct LockFreeAddressHashSet<const K: usize = KEYS_PER_NODE, A: Allocator = DefaultAllocator> {
    //  The lock serializing writers, possibly shared with other sets.
    lock: Arc<AddressLock>,
    //  The heads of the chains; the length is a power of 2, and never changes.
    buckets: Box<[AcqRelPtr<Node<K>>]>,
    bucket_mask: usize,
    //  The number of keys, only accessed with `lock` held.
    size: RelaxedUsize,
    //  A filter to speed up lookups of addresses not in the set.
    filter: Option<LockFreeBloomFilter>,
    allocator: A,
}

/// A `LockFreeAddressHashSet` with a single key per node.
pub type SingleKeyAddressHashSet<A = DefaultAllocator> = LockFreeAddressHashSet<1, A>;

impl<const K: usize> LockFreeAddressHashSet<K, DefaultAllocator> {
    /// Creates a new instance with `buckets_count` buckets, and no Bloom filter.
    ///
    /// Writers must hold `lock`; readers need not.
    ///
    /// No key slot is allocated.
    ///
    /// #   Errors
    ///
    /// Returns an error if `buckets_count` is not a power of 2, or exceeds
    /// `MAX_BUCKETS_COUNT`.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::failure::Failure;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    ///
    /// let set: Result<LockFreeAddressHashSet, _> = LockFreeAddressHashSet::try_new(6, lock.clone());
    /// assert_eq!(Some(Failure::BucketsCountNotPowerOfTwo(6)), set.err());
    ///
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::try_new(8, lock).unwrap();
    /// assert_eq!(8, set.buckets_count());
    /// assert!(set.bloom_filter().is_none());
    /// ```
    pub fn try_new(buckets_count: usize, lock: Arc<AddressLock>) -> Result<Self> {
        Self::try_with_config(HashSetConfig::new(buckets_count), lock)
    }

    /// Creates a new instance with `buckets_count` buckets, and no Bloom filter.
    ///
    /// Calling this method is equivalent to calling `try_new` and panicking
    /// on error.
    ///
    /// #   Panics
    ///
    /// Panics if `buckets_count` is not a power of 2, or exceeds
    /// `MAX_BUCKETS_COUNT`.
    pub fn new(buckets_count: usize, lock: Arc<AddressLock>) -> Self {
        Self::try_new(buckets_count, lock).unwrap_or_else(|failure| panic_from_failure(failure))
    }

    /// Creates a new instance with `buckets_count` buckets, and a Bloom
    /// filter applying `num_hash_functions` per key.
    ///
    /// #   Errors
    ///
    /// Returns an error if `buckets_count` is invalid, or if
    /// `num_hash_functions` is 0.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::failure::Failure;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    ///
    /// let set: Result<LockFreeAddressHashSet, _> =
    ///     LockFreeAddressHashSet::try_with_bloom_filter(8, lock.clone(), 0);
    /// assert_eq!(Some(Failure::NoHashFunctions), set.err());
    ///
    /// let set: LockFreeAddressHashSet =
    ///     LockFreeAddressHashSet::try_with_bloom_filter(8, lock, 2).unwrap();
    /// assert_eq!(Some(2), set.bloom_filter().map(|f| f.num_hash_functions()));
    /// ```
    pub fn try_with_bloom_filter(
        buckets_count: usize,
        lock: Arc<AddressLock>,
        num_hash_functions: usize,
    )
        -> Result<Self>
    {
        let config = HashSetConfig::new(buckets_count)
            .with_bloom_filter(BloomFilterConfig::new(num_hash_functions));

        Self::try_with_config(config, lock)
    }

    /// Creates a new instance, as per `config`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn try_with_config(config: HashSetConfig, lock: Arc<AddressLock>) -> Result<Self> {
        Self::try_with_config_and_allocator(config, lock, DefaultAllocator)
    }

    /// Creates a new instance, as per `config`.
    ///
    /// #   Panics
    ///
    /// Panics if `config` is invalid.
    pub fn with_config(config: HashSetConfig, lock: Arc<AddressLock>) -> Self {
        Self::try_with_config(config, lock).unwrap_or_else(|failure| panic_from_failure(failure))
    }
}

impl<const K: usize, A: Allocator> LockFreeAddressHashSet<K, A> {
    /// Creates a new instance, as per `config`, allocating its nodes with
    /// `allocator`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn try_with_config_and_allocator(
        config: HashSetConfig,
        lock: Arc<AddressLock>,
        allocator: A,
    )
        -> Result<Self>
    {
        let buckets_count = config.buckets_count;

        //  Not rounded up: callers asking for a specific count get it, or an error.
        if !buckets_count.is_power_of_two() {
            return Err(Failure::BucketsCountNotPowerOfTwo(buckets_count));
        }

        if buckets_count as u64 > MAX_BUCKETS_COUNT {
            return Err(Failure::TooManyBuckets(buckets_count));
        }

        let filter = config.bloom_filter
            .map(|bloom| LockFreeBloomFilter::try_new(bloom.num_hash_functions))
            .transpose()?;

        let buckets = (0..buckets_count).map(|_| AcqRelPtr::null()).collect();

        debug!(
            buckets_count,
            keys_per_node = K,
            num_hash_functions = filter.as_ref().map(LockFreeBloomFilter::num_hash_functions),
            "created address hash set"
        );

        Ok(Self {
            lock,
            buckets,
            bucket_mask: buckets_count - 1,
            size: RelaxedUsize::new(0),
            filter,
            allocator,
        })
    }

    /// Creates a new instance, as per `config`, allocating its nodes with
    /// `allocator`.
    ///
    /// #   Panics
    ///
    /// Panics if `config` is invalid.
    pub fn with_config_and_allocator(
        config: HashSetConfig,
        lock: Arc<AddressLock>,
        allocator: A,
    )
        -> Self
    {
        Self::try_with_config_and_allocator(config, lock, allocator)
            .unwrap_or_else(|failure| panic_from_failure(failure))
    }
}

impl<const K: usize, A: Allocator> LockFreeAddressHashSet<K, A> {
    /// Returns the lock serializing the writers of this instance.
    pub fn address_lock(&self) -> &Arc<AddressLock> { &self.lock }

    /// Returns the number of buckets.
    ///
    /// Does not require the lock, as it never changes.
    pub fn buckets_count(&self) -> usize {
        debug_assert_eq!(self.buckets.len(), self.bucket_mask + 1);
        self.buckets.len()
    }

    /// Returns the Bloom filter, if any.
    pub fn bloom_filter(&self) -> Option<&LockFreeBloomFilter> { self.filter.as_ref() }

    /// Returns the number of keys.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::address::Address;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
    ///
    /// let guard = lock.lock();
    /// assert_eq!(0, set.size(&guard));
    ///
    /// set.insert(&guard, Address::new(1).unwrap());
    /// assert_eq!(1, set.size(&guard));
    /// ```
    pub fn size(&self, guard: &AddressLockGuard<'_>) -> usize {
        self.check_guard(guard);
        self.size.load()
    }

    /// Returns whether the instance contains no key.
    pub fn is_empty(&self, guard: &AddressLockGuard<'_>) -> bool { self.size(guard) == 0 }

    /// Returns the average number of keys per bucket.
    pub fn load_factor(&self, guard: &AddressLockGuard<'_>) -> f64 {
        self.size(guard) as f64 / self.buckets_count() as f64
    }

    /// Returns `true` if the set contains `key`.
    ///
    /// May be called without holding the lock, concurrently with a writer. The
    /// result of a concurrent `insert` or `remove` of `key` itself is racy.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::address::Address;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
    /// let key = Address::new(0x1000).unwrap();
    ///
    /// assert!(!set.contains(key));
    ///
    /// set.insert(&lock.lock(), key);
    /// assert!(set.contains(key));
    /// ```
    #[inline]
    pub fn contains(&self, key: Address) -> bool { self.lookup(key).is_found() }

    /// Looks up `key`, consulting the Bloom filter first, if any.
    ///
    /// Like `contains`, may be called without holding the lock. Unlike
    /// `contains`, it distinguishes false positives of the Bloom filter.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::address::Address;
    /// #   use addrset::hashset::{ContainsResult, LockFreeAddressHashSet};
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet =
    ///     LockFreeAddressHashSet::try_with_bloom_filter(8, lock.clone(), 2).unwrap();
    /// let key = Address::new(0x1000).unwrap();
    ///
    /// let guard = lock.lock();
    /// set.insert(&guard, key);
    /// assert_eq!(ContainsResult::Found, set.lookup(key));
    ///
    /// //  The bits of removed keys linger until the filter is rebuilt.
    /// set.remove(&guard, key);
    /// assert_eq!(ContainsResult::NotFoundButMatchedInBloomFilter, set.lookup(key));
    ///
    /// set.rebuild_filter(&guard);
    /// assert_eq!(ContainsResult::NotFound, set.lookup(key));
    /// ```
    #[inline]
    pub fn lookup(&self, key: Address) -> ContainsResult {
        let Some(filter) = &self.filter else {
            return if self.find(key).is_some() {
                ContainsResult::Found
            } else {
                ContainsResult::NotFound
            };
        };

        if !filter.maybe_contains(key) {
            return ContainsResult::NotFound;
        }

        //  The filter may have false positives, the chain is authoritative.
        if self.find(key).is_some() {
            ContainsResult::Found
        } else {
            ContainsResult::NotFoundButMatchedInBloomFilter
        }
    }

    /// Inserts `key`.
    ///
    /// Deleted slots are reused, if any; otherwise a node is allocated.
    ///
    /// #   Panics
    ///
    /// Panics if `key` is already present, or if the allocation of a node
    /// fails.
    pub fn insert(&self, guard: &AddressLockGuard<'_>, key: Address) {
        self.check_guard(guard);

        if self.contains(key) {
            panic_key_already_present(key);
        }

        //  The filter is updated first, so that a concurrent reader may find
        //  the key in the filter but not in the chain, but never the reverse.
        if let Some(filter) = &self.filter {
            filter.add(key);
        }

        self.size.store(self.size.load() + 1);

        let bucket = self.bucket(key);

        //  Single writer: the head cannot change under our feet.
        let head = bucket.load_exclusive();

        //  Safety:
        //  -   `head` was stored by this writer, or one who released the lock.
        //  -   Nodes are not deallocated while `self` is borrowed.
        for node in unsafe { Chain::new(head) } {
            for slot in node.keys() {
                let existing = slot.load();

                if existing == EMPTY || existing == DELETED {
                    //  Readers load either the former value or `key`, both
                    //  consistent with some sequential history.
                    slot.store(key.get());
                    return;
                }
            }
        }

        //  No free slot left in the bucket: prepend a new node, publishing it
        //  only once fully initialized.
        let node = self.allocate_node(key, head);
        bucket.store(node);
    }

    /// Removes `key`.
    ///
    /// The slot of `key` is marked as deleted, for a latter `insert` to reuse;
    /// the Bloom filter, if any, is not updated until `rebuild_filter`.
    ///
    /// #   Panics
    ///
    /// Panics if `key` is not present.
    pub fn remove(&self, guard: &AddressLockGuard<'_>, key: Address) {
        self.check_guard(guard);

        //  The node cannot be unlinked, or deallocated, as another thread may
        //  currently be iterating over it.
        let Some(slot) = self.find(key) else { panic_key_not_present(key) };

        slot.store(DELETED);

        self.size.store(self.size.load() - 1);
    }

    /// Recomputes the Bloom filter from the current keys.
    ///
    /// Forgets the bits of the removed keys, restoring the accuracy of the
    /// filter. Does nothing in the absence of a filter.
    pub fn rebuild_filter(&self, guard: &AddressLockGuard<'_>) {
        self.check_guard(guard);

        let Some(filter) = &self.filter else { return };

        let bits = self.iter(guard)
            .fold(0 as BitStorage, |bits, key| bits | filter.bits_for_key(key));

        let before = filter.count_bits();

        //  Every current key is covered by both the former and new bits, hence
        //  a concurrent reader cannot observe a false negative either way.
        filter.atomic_set_bits(bits);

        debug!(before, after = bits.count_ones(), "rebuilt bloom filter");
    }

    /// Copies the keys of `other` into the current instance.
    ///
    /// `guard` must hold the lock of the current instance, and `other_guard`
    /// the lock of `other`; they may be the same guard when both instances
    /// share a lock.
    ///
    /// The storage is not shared: both instances are independent afterwards.
    ///
    /// #   Panics
    ///
    /// Panics if the current instance is not empty.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::address::Address;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
    /// let copy: LockFreeAddressHashSet = LockFreeAddressHashSet::new(64, lock.clone());
    ///
    /// let guard = lock.lock();
    /// set.insert(&guard, Address::new(1).unwrap());
    /// set.insert(&guard, Address::new(2).unwrap());
    ///
    /// copy.copy(&guard, &set, &guard);
    /// assert_eq!(2, copy.size(&guard));
    /// assert!(copy.contains(Address::new(2).unwrap()));
    /// ```
    pub fn copy<const L: usize, B: Allocator>(
        &self,
        guard: &AddressLockGuard<'_>,
        other: &LockFreeAddressHashSet<L, B>,
        other_guard: &AddressLockGuard<'_>,
    ) {
        self.check_guard(guard);

        if !self.is_empty(guard) {
            panic_copy_target_not_empty(self.size(guard));
        }

        let mut copied = 0usize;

        for key in other.iter(other_guard) {
            self.insert(guard, key);
            copied += 1;
        }

        debug!(copied, "copied address hash set");
    }

    /// Returns an iterator over the keys.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::address::Address;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
    ///
    /// let guard = lock.lock();
    /// for i in 1..=3 {
    ///     set.insert(&guard, Address::new(i).unwrap());
    /// }
    /// set.remove(&guard, Address::new(2).unwrap());
    ///
    /// let mut keys: Vec<_> = set.iter(&guard).map(Address::get).collect();
    /// keys.sort();
    ///
    /// assert_eq!(vec![1, 3], keys);
    /// ```
    pub fn iter<'a>(&'a self, guard: &'a AddressLockGuard<'_>) -> Keys<'a, K> {
        self.check_guard(guard);

        //  Safety:
        //  -   The lock is held for 'a, as the guard is borrowed.
        unsafe { Keys::new(&self.buckets) }
    }

    /// Returns statistics about the buckets.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use std::sync::Arc;
    /// #   use addrset::hashset::LockFreeAddressHashSet;
    /// #   use addrset::lock::AddressLock;
    /// let lock = Arc::new(AddressLock::new());
    /// let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(8, lock.clone());
    ///
    /// let stats = set.bucket_stats(&lock.lock());
    /// assert_eq!(vec![0; 8], stats.lengths);
    /// assert_eq!(1.0, stats.chi_squared);
    /// ```
    pub fn bucket_stats(&self, guard: &AddressLockGuard<'_>) -> BucketStats {
        self.check_guard(guard);

        let mut lengths = Vec::with_capacity(self.buckets.len());
        let mut counts = Vec::with_capacity(self.buckets.len());

        for bucket in self.buckets.iter() {
            let (mut length, mut count) = (0, 0);

            //  Safety:
            //  -   The lock is held.
            //  -   Nodes are not deallocated while `self` is borrowed.
            for node in unsafe { Chain::new(bucket.load_exclusive()) } {
                //  Deleted slots count towards the length, as lookups must
                //  search them.
                for slot in node.keys() {
                    match slot.load() {
                        EMPTY => break,
                        DELETED => length += 1,
                        _ => {
                            length += 1;
                            count += 1;
                        },
                    }
                }
            }

            lengths.push(length);
            counts.push(count);
        }

        BucketStats::new(lengths, chi_squared(&counts))
    }

    //  Returns the bucket of `key`.
    #[inline(always)]
    fn bucket(&self, key: Address) -> &AcqRelPtr<Node<K>> {
        let index = address_hash(key.get()) as usize & self.bucket_mask;

        debug_assert!(index < self.buckets.len());

        //  Safety:
        //  -   `bucket_mask` is `buckets.len() - 1`, and `buckets.len()` a
        //      power of 2.
        unsafe { self.buckets.get_unchecked(index) }
    }

    //  Returns the slot holding `key`, if any.
    #[inline(always)]
    fn find(&self, key: Address) -> Option<&RelaxedUsize> {
        //  Acquire synchronizes with the Release publication of the head, and
        //  transitively of all the nodes it links to.
        let head = self.bucket(key).load();

        //  Safety:
        //  -   `head` is null, or has been published.
        //  -   Nodes are not deallocated while `self` is borrowed.
        unsafe { Chain::new(head) }.find_map(|node| node.find(key))
    }

    //  Allocates a node holding `key`, prepended to `next`.
    fn allocate_node(&self, key: Address, next: *mut Node<K>) -> *mut Node<K> {
        let layout = Layout::new::<Node<K>>();

        //  Safety:
        //  -   The layout is not zero-sized, as a Node holds at least its `next`.
        let node = unsafe { self.allocator.allocate(layout) } as *mut Node<K>;

        if node.is_null() {
            alloc::handle_alloc_error(layout);
        }

        //  Safety:
        //  -   `node` is valid for writes, and suitably aligned, per `layout`.
        unsafe { ptr::write(node, Node::new(key, next)) };

        node
    }

    //  Checks that `guard` guards the lock of this instance.
    //
    //  A foreign guard does not exclude other writers, hence checked in all
    //  builds.
    #[inline(always)]
    fn check_guard(&self, guard: &AddressLockGuard<'_>) {
        if !guard.is_guarding(&self.lock) {
            panic_foreign_guard();
        }
    }
}

impl<const K: usize, A: Allocator> Drop for LockFreeAddressHashSet<K, A> {
    fn drop(&mut self) {
        let layout = Layout::new::<Node<K>>();

        for bucket in self.buckets.iter() {
            let mut node = bucket.load_exclusive();

            while !node.is_null() {
                //  Safety:
                //  -   Exclusive access, hence no concurrent reader.
                //  -   `node` was allocated by `self.allocator` with `layout`.
                //  -   `node` is unlinked from the chain before deallocation.
                unsafe {
                    let next = (*node).next();
                    ptr::drop_in_place(node);
                    self.allocator.deallocate(node as *mut u8, layout);
                    node = next;
                }
            }

            bucket.store(ptr::null_mut());
        }
    }
}

impl<const K: usize, A: Allocator> fmt::Debug for LockFreeAddressHashSet<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeAddressHashSet")
            .field("buckets_count", &self.buckets_count())
            .field("keys_per_node", &K)
            .field("bloom_filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cold]
#[inline(never)]
fn panic_key_already_present(key: Address) -> ! {
    panic!("key {:?} already present", key);
}

#[cold]
#[inline(never)]
fn panic_key_not_present(key: Address) -> ! {
    panic!("key {:?} not present", key);
}

#[cold]
#[inline(never)]
fn panic_foreign_guard() -> ! {
    panic!("lock not held: the guard belongs to another lock");
}

#[cold]
#[inline(never)]
fn panic_copy_target_not_empty(size: usize) -> ! {
    panic!("copy target not empty: {} keys", size);
}

//  mod tests
