//! Internal utilities.

pub mod atomic;
pub mod hash;

#[cfg(test)]
pub mod tester;
