//! Statistics about the buckets of the hash set.

/// `BucketStats`
///
/// Statistics about the buckets of a `LockFreeAddressHashSet`, for metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketStats {
    /// Length of each bucket, that is the number of key slots which must be
    /// searched, including the slots of removed keys.
    pub lengths: Vec<usize>,
    /// Result of a chi-squared test measuring the uniformity of the buckets
    /// usage; close to 1.0 for a good hash function.
    pub chi_squared: f64,
}

impl BucketStats {
    //  Creates an instance.
    pub(crate) fn new(lengths: Vec<usize>, chi_squared: f64) -> Self {
        Self { lengths, chi_squared }
    }

    /// Returns the length of the longest bucket.
    pub fn max_length(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }
}

//  Returns the uniformity statistic of distributing `counts` across buckets.
//
//  For n keys in m buckets, with b_j keys in the j-th bucket, this is:
//
//      sum(b_j * (b_j + 1) / 2) / ((n / 2m) * (n + 2m - 1))
//
//  which is 1.0 when each placement is uniformly random. The statistic is
//  defined as 1.0 in the absence of keys.
//
//  See https://en.wikipedia.org/wiki/Hash_function#Testing_and_measurement
pub(crate) fn chi_squared(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();

    if n == 0 {
        return 1.0;
    }

    let n = n as f64;
    let m = counts.len() as f64;

    let observed: f64 = counts.iter()
        .map(|&b| {
            let b = b as f64;
            b * (b + 1.0) / 2.0
        })
        .sum();

    observed / ((n / (2.0 * m)) * (n + 2.0 * m - 1.0))
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn chi_squared_empty() {
    assert_eq!(1.0, chi_squared(&[0; 16]));
}

#[test]
fn chi_squared_uniform() {
    let chi = chi_squared(&[625; 16]);

    //  (n + m) / (n + 2m - 1)
    assert!((chi - 10016.0 / 10031.0).abs() < 1e-12, "{}", chi);
}

#[test]
fn chi_squared_skewed() {
    let mut counts = [0; 16];
    counts[3] = 10_000;

    //  All keys in a single bucket: roughly m times worse than uniform.
    assert!(chi_squared(&counts) > 15.0);
}

#[test]
fn max_length() {
    assert_eq!(0, BucketStats::new(vec![], 1.0).max_length());
    assert_eq!(7, BucketStats::new(vec![3, 7, 1], 1.0).max_length());
}

}
