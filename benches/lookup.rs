//! Lookup benchmarks.
//!
//! Measures `contains` on present and absent addresses, with and without the
//! Bloom filter, as a function of the load factor.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use addrset::address::Address;
use addrset::config::{BloomFilterConfig, HashSetConfig};
use addrset::hashset::LockFreeAddressHashSet;
use addrset::lock::AddressLock;

const BUCKETS_COUNT: usize = 1024;
const LOOKUPS: usize = 10_000;

//  Aligned addresses, as returned by an allocator.
fn generate_addresses(rng: &mut StdRng, count: usize) -> Vec<Address> {
    (0..count)
        .map(|_| Address::new(rng.gen_range(1usize..1 << 40) << 4).unwrap())
        .collect()
}

fn build_set(bloom_filter: Option<BloomFilterConfig>, keys: &[Address]) -> LockFreeAddressHashSet {
    let lock = Arc::new(AddressLock::new());
    let config = HashSetConfig { buckets_count: BUCKETS_COUNT, bloom_filter };
    let set: LockFreeAddressHashSet = LockFreeAddressHashSet::with_config(config, lock.clone());

    let guard = lock.lock();

    for &key in keys {
        if !set.contains(key) {
            set.insert(&guard, key);
        }
    }

    drop(guard);
    set
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    group.throughput(Throughput::Elements(LOOKUPS as u64));

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let absent = generate_addresses(&mut rng, LOOKUPS);

    for &load_factor in &[1usize, 4, 16] {
        let present = generate_addresses(&mut rng, BUCKETS_COUNT * load_factor);

        for (name, bloom_filter) in [("plain", None), ("bloom", Some(BloomFilterConfig::default()))] {
            let set = build_set(bloom_filter, &present);

            group.bench_with_input(
                BenchmarkId::new(format!("{}/present", name), load_factor),
                &present,
                |b, present| {
                    b.iter(|| {
                        present.iter().take(LOOKUPS).filter(|&&key| set.contains(black_box(key))).count()
                    })
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("{}/absent", name), load_factor),
                &absent,
                |b, absent| {
                    b.iter(|| absent.iter().filter(|&&key| set.contains(black_box(key))).count())
                },
            );
        }
    }

    group.finish();
}

fn bench_insert_remove(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc0ffee);
    let keys = generate_addresses(&mut rng, BUCKETS_COUNT);

    let lock = Arc::new(AddressLock::new());
    let set: LockFreeAddressHashSet = LockFreeAddressHashSet::new(BUCKETS_COUNT, lock.clone());

    let mut unique = keys.clone();
    unique.sort_unstable();
    unique.dedup();

    c.bench_function("insert_remove", |b| {
        b.iter(|| {
            let guard = lock.lock();

            for &key in &unique {
                set.insert(&guard, black_box(key));
            }

            for &key in &unique {
                set.remove(&guard, black_box(key));
            }
        })
    });
}

criterion_group!(benches, bench_contains, bench_insert_remove);
criterion_main!(benches);
