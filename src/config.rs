//! Construction-time configuration.
//!
//! Whether the Bloom filter is used, and how many hash functions it applies
//! per key, is typically decided by an experiment toggle. The configuration is
//! consumed once, when constructing the set; it cannot be changed afterwards.
//!
//! With the `serde` feature, the configuration can be deserialized, for
//! example from a JSON experiment definition:
//!
//! ```
//! # #[cfg(feature = "serde")]
//! # fn main() -> Result<(), serde_json::Error> {
//! use addrset::config::{BloomFilterConfig, HashSetConfig};
//!
//! let config: HashSetConfig = serde_json::from_str(
//!     r#"{ "buckets_count": 256, "bloom_filter": { "num_hash_functions": 2 } }"#,
//! )?;
//!
//! assert_eq!(HashSetConfig::new(256).with_bloom_filter(BloomFilterConfig::new(2)), config);
//! # Ok(())
//! # }
//! #
//! # #[cfg(not(feature = "serde"))]
//! # fn main() {}
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default number of buckets.
pub const DEFAULT_BUCKETS_COUNT: usize = 1024;

/// The default number of hash functions of the Bloom filter.
pub const DEFAULT_NUM_HASH_FUNCTIONS: usize = 3;

/// Configuration of a `LockFreeAddressHashSet`.
///
/// #   Example
///
/// ```
/// use addrset::config::{BloomFilterConfig, HashSetConfig};
///
/// let config = HashSetConfig::default();
/// assert_eq!(1024, config.buckets_count);
/// assert_eq!(None, config.bloom_filter);
///
/// let config = HashSetConfig::new(64).with_bloom_filter(BloomFilterConfig::default());
/// assert_eq!(64, config.buckets_count);
/// assert_eq!(Some(3), config.bloom_filter.map(|b| b.num_hash_functions));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HashSetConfig {
    /// The number of buckets, a power of 2.
    pub buckets_count: usize,
    /// The configuration of the Bloom filter, if enabled.
    pub bloom_filter: Option<BloomFilterConfig>,
}

impl HashSetConfig {
    /// Creates a configuration with `buckets_count` buckets, and no Bloom filter.
    pub fn new(buckets_count: usize) -> Self {
        Self { buckets_count, bloom_filter: None }
    }

    /// Enables the Bloom filter.
    pub fn with_bloom_filter(self, bloom_filter: BloomFilterConfig) -> Self {
        Self { bloom_filter: Some(bloom_filter), ..self }
    }

    /// Disables the Bloom filter.
    pub fn without_bloom_filter(self) -> Self {
        Self { bloom_filter: None, ..self }
    }
}

impl Default for HashSetConfig {
    fn default() -> Self { Self::new(DEFAULT_BUCKETS_COUNT) }
}

/// Configuration of a `LockFreeBloomFilter`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BloomFilterConfig {
    /// The number of bits set per key, at least 1.
    pub num_hash_functions: usize,
}

impl BloomFilterConfig {
    /// Creates a configuration applying `num_hash_functions` per key.
    pub fn new(num_hash_functions: usize) -> Self { Self { num_hash_functions } }
}

impl Default for BloomFilterConfig {
    fn default() -> Self { Self::new(DEFAULT_NUM_HASH_FUNCTIONS) }
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn builder() {
    let config = HashSetConfig::new(16).with_bloom_filter(BloomFilterConfig::new(5));

    assert_eq!(16, config.buckets_count);
    assert_eq!(Some(BloomFilterConfig::new(5)), config.bloom_filter);

    let config = config.without_bloom_filter();
    assert_eq!(HashSetConfig::new(16), config);
}

#[cfg(feature = "serde")]
#[test]
fn deserialize() {
    let config: HashSetConfig = serde_json::from_str(
        r#"{ "buckets_count": 256, "bloom_filter": { "num_hash_functions": 2 } }"#,
    ).unwrap();

    assert_eq!(HashSetConfig::new(256).with_bloom_filter(BloomFilterConfig::new(2)), config);

    let config: HashSetConfig = serde_json::from_str(r#"{ "bloom_filter": {} }"#).unwrap();

    assert_eq!(HashSetConfig::default().with_bloom_filter(BloomFilterConfig::default()), config);
}

}
