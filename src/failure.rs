//! The Failure and Result types of this library.
//!
//! The only operations which may fail are the constructors, which validate
//! their parameters. The cause of the error is then represented as a
//! `Failure`.
//!
//! All faillible constructors come in two versions:
//!
//! -   A faillible `try_xxx` version, which returns a `Result` with `Failure` as the error type.
//! -   A convenience `xxx` version, which invokes the `try_xxx` version and panics in case of error.
//!
//! Misuse of a constructed set, such as inserting a key twice, is a bug in the
//! caller rather than a failure, and panics.

use std::result;

/// Universal Failure type of this library.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, thiserror::Error)]
pub enum Failure {
    /// The number of buckets is not a power of 2, or is 0.
    #[error("buckets count {0} is not a power of 2")]
    BucketsCountNotPowerOfTwo(usize),
    /// The number of buckets exceeds the range of the 32 bits hash.
    #[error("buckets count {0} exceeds the maximum of {}", crate::hashset::MAX_BUCKETS_COUNT)]
    TooManyBuckets(usize),
    /// A Bloom filter requires at least one hash function.
    #[error("a bloom filter requires at least one hash function")]
    NoHashFunctions,
}

/// Universal Result type of this library.
pub type Result<T> = result::Result<T, Failure>;

#[cold]
#[inline(never)]
pub(crate) fn panic_from_failure(failure: Failure) -> ! {
    panic!("{}", failure);
}
