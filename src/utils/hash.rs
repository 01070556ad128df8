//! Hashing of addresses.
//!
//! Two families of hashes are necessary:
//!
//! -   A single, very fast, 32 bits hash selecting the bucket of the set.
//! -   An arbitrary number of independent hashes for the Bloom filter.

use xxhash_rust::xxh3::xxh3_64;

//  Odd multiplier, the high bits of the product are well mixed.
const MULTIPLIER: u64 = 0x4bfd_b9df_5a6f_243b;

//  Returns the bucket hash of `key`.
//
//  The low bits of an address are very regular, due to alignment, hence the
//  high half of the product is kept.
#[inline(always)]
pub fn address_hash(key: usize) -> u32 {
    ((key as u64).wrapping_mul(MULTIPLIER) >> 32) as u32
}

//  Returns the `salt`-th hash of `key`.
#[inline(always)]
pub fn salted_hash(key: usize, salt: usize) -> u64 {
    let mut input = [0u8; 16];
    input[..8].copy_from_slice(&(key as u64).to_le_bytes());
    input[8..].copy_from_slice(&(salt as u64).to_le_bytes());

    xxh3_64(&input)
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn address_hash_keeps_high_bits() {
    assert_eq!(0, address_hash(0));
    assert_eq!((MULTIPLIER >> 32) as u32, address_hash(1));
}

#[test]
fn address_hash_spreads_aligned_addresses() {
    let buckets: std::collections::HashSet<_> = (0..64usize)
        .map(|i| address_hash(0x10000 + 0x10 * i) & 7)
        .collect();

    assert_eq!(8, buckets.len());
}

#[test]
fn salted_hash_independence() {
    assert_eq!(salted_hash(0x1000, 0), salted_hash(0x1000, 0));
    assert_ne!(salted_hash(0x1000, 0), salted_hash(0x1000, 1));
    assert_ne!(salted_hash(0x1000, 0), salted_hash(0x1001, 0));
}

}
