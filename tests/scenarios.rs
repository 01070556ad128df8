//! End-to-end usage of the LockFreeAddressHashSet, as the bookkeeping of a
//! sampling heap profiler.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use addrset::address::Address;
use addrset::allocator::{Allocator, DefaultAllocator, Layout};
use addrset::config::{BloomFilterConfig, HashSetConfig};
use addrset::hashset::{ContainsResult, LockFreeAddressHashSet};
use addrset::lock::AddressLock;

fn address(value: usize) -> Address { Address::new(value).unwrap() }

//  An allocator counting its live allocations.
#[derive(Default)]
struct CountingAllocator {
    live: AtomicUsize,
}

impl Allocator for CountingAllocator {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        self.live.fetch_add(1, Ordering::Relaxed);
        DefaultAllocator.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        self.live.fetch_sub(1, Ordering::Relaxed);
        DefaultAllocator.deallocate(ptr, layout)
    }
}

#[test]
fn sample_real_allocations() {
    let lock = Arc::new(AddressLock::new());
    let config = HashSetConfig::new(64).with_bloom_filter(BloomFilterConfig::default());
    let sampled: LockFreeAddressHashSet = LockFreeAddressHashSet::with_config(config, lock.clone());

    let allocations: Vec<Box<[u8; 32]>> = (0..256).map(|_| Box::new([0; 32])).collect();

    //  Sample one allocation out of 4.
    {
        let guard = lock.lock();

        for allocation in allocations.iter().step_by(4) {
            sampled.insert(&guard, Address::from_ptr(&**allocation).unwrap());
        }

        assert_eq!(64, sampled.size(&guard));
    }

    //  Deallocations check whether their address was sampled, without locking.
    let mut found = 0;

    for (i, allocation) in allocations.iter().enumerate() {
        let key = Address::from_ptr(&**allocation).unwrap();

        if sampled.contains(key) {
            assert_eq!(0, i % 4, "{}", i);
            found += 1;

            sampled.remove(&lock.lock(), key);
        }
    }

    assert_eq!(64, found);
    assert!(sampled.is_empty(&lock.lock()));
}

#[test]
fn shared_lock_snapshot() {
    //  Two sets sharing a lock: the live one, and a copy taken for a report.
    let lock = Arc::new(AddressLock::new());
    let live: LockFreeAddressHashSet = LockFreeAddressHashSet::new(32, lock.clone());
    let report: LockFreeAddressHashSet = LockFreeAddressHashSet::new(256, lock.clone());

    let guard = lock.lock();

    for i in 1..=500 {
        live.insert(&guard, address(i * 8));
    }

    for i in (1..=500).filter(|i| i % 5 == 0) {
        live.remove(&guard, address(i * 8));
    }

    report.copy(&guard, &live, &guard);

    assert_eq!(400, report.size(&guard));

    //  The copy is independent.
    live.remove(&guard, address(8));

    assert!(!live.contains(address(8)));
    assert!(report.contains(address(8)));
    assert_eq!(399, live.size(&guard));
    assert_eq!(400, report.size(&guard));

    //  More buckets, shorter chains.
    let live_stats = live.bucket_stats(&guard);
    let report_stats = report.bucket_stats(&guard);

    assert_eq!(32, live_stats.lengths.len());
    assert_eq!(256, report_stats.lengths.len());
    assert!(report_stats.max_length() < live_stats.max_length());
}

#[test]
fn readers_while_writing() {
    let lock = Arc::new(AddressLock::new());
    let config = HashSetConfig::new(16).with_bloom_filter(BloomFilterConfig::new(2));
    let set: Arc<LockFreeAddressHashSet> =
        Arc::new(LockFreeAddressHashSet::with_config(config, lock.clone()));

    {
        let guard = lock.lock();
        for i in 1..=64 {
            set.insert(&guard, address(i));
        }
    }

    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4).map(|_| {
        let (set, done) = (set.clone(), done.clone());

        thread::spawn(move || {
            let mut rounds = 0usize;

            while !done.load(Ordering::Acquire) || rounds == 0 {
                for i in 1..=64 {
                    assert!(set.contains(address(i)), "{}", i);
                }
                rounds += 1;
            }

            rounds
        })
    }).collect();

    //  Churn through keys which readers never look for.
    for round in 0..50 {
        let guard = lock.lock();

        for i in 0..100 {
            set.insert(&guard, address(0x10000 + i));
        }

        for i in 0..100 {
            set.remove(&guard, address(0x10000 + i));
        }

        if round % 10 == 0 {
            set.rebuild_filter(&guard);
        }
    }

    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    assert_eq!(64, set.size(&lock.lock()));
}

#[test]
fn filter_false_positive_until_rebuild() {
    let lock = Arc::new(AddressLock::new());
    let set: LockFreeAddressHashSet =
        LockFreeAddressHashSet::try_with_bloom_filter(64, lock.clone(), 3).unwrap();

    let guard = lock.lock();
    let key = address(0xdead_0000);

    set.insert(&guard, key);
    set.remove(&guard, key);

    assert_eq!(ContainsResult::NotFoundButMatchedInBloomFilter, set.lookup(key));
    assert!(!set.contains(key));

    set.rebuild_filter(&guard);

    assert_eq!(ContainsResult::NotFound, set.lookup(key));
    assert_eq!(0, set.bloom_filter().unwrap().bits());
}

#[test]
fn custom_allocator_releases_nodes() {
    let lock = Arc::new(AddressLock::new());
    let allocator = CountingAllocator::default();

    {
        let set: LockFreeAddressHashSet<7, &CountingAllocator> =
            LockFreeAddressHashSet::with_config_and_allocator(HashSetConfig::new(8), lock.clone(), &allocator);

        let guard = lock.lock();

        for i in 1..=1000 {
            set.insert(&guard, address(i));
        }

        assert!(allocator.live.load(Ordering::Relaxed) >= 1000 / 7);
    }

    assert_eq!(0, allocator.live.load(Ordering::Relaxed));
}
