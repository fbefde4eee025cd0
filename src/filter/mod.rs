//! Membership filter module
//!
//! This module provides the probabilistic "have we seen this URL before?" set used
//! for deduplicating discovered links:
//! - `BloomFilter`: fixed-size, lock-free Bloom filter with double hashing
//! - `BuiltinHash`: secondary hash functions for strings and integers
//!
//! The filter never produces false negatives. False positives are bounded by the
//! error rate chosen at construction.

mod bloom;
mod hash;

pub use bloom::{best_error_rate, best_hash_rounds, best_bit_count, BloomFilter, SecondaryHash};
pub use hash::{int_hash, string_hash, BuiltinHash};

use thiserror::Error;

/// Errors raised while constructing a membership filter
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("capacity must be > 0, got {0}")]
    InvalidCapacity(u64),

    #[error("error rate must be between 0 and 1, exclusive, got {0}")]
    InvalidErrorRate(f64),

    #[error(
        "capacity {capacity} and error rate {error_rate} would need a bit array larger than supported; reduce either value"
    )]
    TooLarge { capacity: u64, error_rate: f64 },

    #[error("no secondary hash function was provided for this element type")]
    MissingHashFunction,
}
