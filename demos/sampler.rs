//! A simple sampling profiler example.
//!
//! In this example, there are two threads:
//! -   A Sampler thread will intermittently sample new allocations, adding their addresses to the set, and forget
//!     some older ones.
//! -   A Deallocator thread will "model" a continuous stream of deallocations and for each check whether the address
//!     was sampled.
//!
//! There could be more Deallocator threads; for clarity there isn't.

extern crate addrset;
extern crate crossbeam_utils;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{thread, time};

use addrset::address::Address;
use addrset::config::{BloomFilterConfig, HashSetConfig};
use addrset::hashset::{ContainsResult, LockFreeAddressHashSet};
use addrset::lock::AddressLock;

const NUMBER_ADDRESSES_PER_BATCH: usize = 16;
const NUMBER_BATCHES: usize = 10;

const PACE_TIME: time::Duration = time::Duration::from_millis(20);

//  Addresses are 16 bytes aligned.
fn address_of(id: usize) -> Address {
    Address::new(0x7f00_0000 + 16 * (id + 1)).unwrap()
}

fn main() {
    let lock = Arc::new(AddressLock::new());
    let config = HashSetConfig::new(64).with_bloom_filter(BloomFilterConfig::default());
    let sampled: LockFreeAddressHashSet = LockFreeAddressHashSet::with_config(config, lock.clone());

    let done = AtomicBool::new(false);

    crossbeam_utils::thread::scope(|scope| {
        //
        //  Deallocator
        //
        scope.spawn(|_| {
            let (mut hits, mut false_positives) = (0, 0);

            while !done.load(Ordering::Acquire) {
                for id in 0..(NUMBER_BATCHES * NUMBER_ADDRESSES_PER_BATCH) {
                    match sampled.lookup(address_of(id)) {
                        ContainsResult::Found => hits += 1,
                        ContainsResult::NotFoundButMatchedInBloomFilter => false_positives += 1,
                        ContainsResult::NotFound => (),
                    }
                }

                thread::sleep(PACE_TIME / 4);
            }

            println!("Deallocator - {} sampled hits, {} bloom filter false positives", hits, false_positives);
        });

        //
        //  Sampler
        //
        for batch in 0..NUMBER_BATCHES {
            let guard = lock.lock();

            //  Sample one address out of 4.
            for i in (0..NUMBER_ADDRESSES_PER_BATCH).step_by(4) {
                sampled.insert(&guard, address_of(batch * NUMBER_ADDRESSES_PER_BATCH + i));
            }

            //  The oldest batch was deallocated.
            if batch >= 2 {
                for i in (0..NUMBER_ADDRESSES_PER_BATCH).step_by(4) {
                    sampled.remove(&guard, address_of((batch - 2) * NUMBER_ADDRESSES_PER_BATCH + i));
                }

                sampled.rebuild_filter(&guard);
            }

            let stats = sampled.bucket_stats(&guard);

            println!(
                "Sampler - batch {}: {} sampled, longest bucket {}, chi-squared {:.3}",
                batch,
                sampled.size(&guard),
                stats.max_length(),
                stats.chi_squared,
            );

            drop(guard);
            thread::sleep(PACE_TIME);
        }

        done.store(true, Ordering::Release);
    }).unwrap();
}
