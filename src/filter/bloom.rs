use crate::filter::hash::BuiltinHash;
use crate::filter::FilterError;
use std::f64::consts::LN_2;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use xxhash_rust::xxh3::Xxh3;

/// Largest bit array the filter will allocate
const MAX_BITS: u64 = i32::MAX as u64;

/// Signature of a secondary hash function
pub type SecondaryHash<T> = fn(&T) -> u64;

/// A concurrent Bloom filter
///
/// Bits are stored in atomic 64-bit words, so `add` and `contains` may be called from
/// any number of workers at once without a lock. Bits are only ever set; the filter
/// has no removal operation.
///
/// Probe `i` (for `i` in `0..k`) lands on `(primary + i * secondary) mod m`, where the
/// primary hash is the element's `Hash` fed through xxh3 and the secondary hash is
/// either built in (strings, integers) or supplied by the caller.
///
/// # Example
///
/// ```
/// use link_ripple::filter::BloomFilter;
///
/// let filter: BloomFilter<str> = BloomFilter::with_error_rate(1_000, 0.01).unwrap();
/// filter.add("https://example.com/");
/// assert!(filter.contains("https://example.com/"));
/// ```
pub struct BloomFilter<T: ?Sized> {
    words: Vec<AtomicU64>,
    bit_count: u64,
    hash_rounds: u32,
    secondary: SecondaryHash<T>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: BuiltinHash + Hash + ?Sized> BloomFilter<T> {
    /// Creates a filter for `capacity` items with an automatically chosen error rate
    ///
    /// The error rate is `1 / capacity`, so a capacity of 1 is rejected.
    pub fn new(capacity: u64) -> Result<Self, FilterError> {
        Self::from_parts(capacity, None, Some(T::builtin_hash as SecondaryHash<T>))
    }

    /// Creates a filter for `capacity` items with an explicit target error rate
    pub fn with_error_rate(capacity: u64, error_rate: f64) -> Result<Self, FilterError> {
        Self::from_parts(capacity, Some(error_rate), Some(T::builtin_hash as SecondaryHash<T>))
    }
}

impl<T: Hash + ?Sized> BloomFilter<T> {
    /// Creates a filter from its raw construction parameters
    ///
    /// # Arguments
    ///
    /// * `capacity` - Expected number of items (must be >= 1)
    /// * `error_rate` - Target false-positive rate; `None` picks one from the capacity
    /// * `secondary` - Secondary hash function; required
    ///
    /// # Returns
    ///
    /// * `Ok(BloomFilter)` - Sized filter with all bits clear
    /// * `Err(FilterError)` - Invalid capacity or error rate, oversized array, or no
    ///   secondary hash function
    pub fn from_parts(
        capacity: u64,
        error_rate: Option<f64>,
        secondary: Option<SecondaryHash<T>>,
    ) -> Result<Self, FilterError> {
        if capacity < 1 {
            return Err(FilterError::InvalidCapacity(capacity));
        }

        let error_rate = error_rate.unwrap_or_else(|| best_error_rate(capacity));
        let bit_count = best_bit_count(capacity, error_rate)?;
        let hash_rounds = best_hash_rounds(capacity, bit_count);

        Self::with_dimensions(capacity, error_rate, secondary, bit_count, hash_rounds)
    }

    /// Creates a filter with an explicit bit count `m` and hash round count `k`
    pub fn with_dimensions(
        capacity: u64,
        error_rate: f64,
        secondary: Option<SecondaryHash<T>>,
        bit_count: u64,
        hash_rounds: u32,
    ) -> Result<Self, FilterError> {
        if capacity < 1 {
            return Err(FilterError::InvalidCapacity(capacity));
        }

        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(FilterError::InvalidErrorRate(error_rate));
        }

        if bit_count < 1 || bit_count > MAX_BITS {
            return Err(FilterError::TooLarge {
                capacity,
                error_rate,
            });
        }

        let secondary = secondary.ok_or(FilterError::MissingHashFunction)?;

        let word_count = bit_count.div_ceil(64) as usize;
        let words = (0..word_count).map(|_| AtomicU64::new(0)).collect();

        tracing::debug!(
            "Membership filter sized for {} items at {}: {} bits, {} hash rounds",
            capacity,
            error_rate,
            bit_count,
            hash_rounds
        );

        Ok(Self {
            words,
            bit_count,
            hash_rounds: hash_rounds.max(1),
            secondary,
            _marker: PhantomData,
        })
    }

    /// Marks an item as seen
    pub fn add(&self, item: &T) {
        let (primary, secondary) = self.hashes(item);

        for round in 0..self.hash_rounds {
            let bit = self.probe(primary, secondary, round);
            let mask = 1u64 << (bit % 64);
            self.words[(bit / 64) as usize].fetch_or(mask, Ordering::Relaxed);
        }
    }

    /// Returns true if the item may have been added
    ///
    /// Always true for items that were added. May be true for items that were not,
    /// at roughly the configured error rate.
    pub fn contains(&self, item: &T) -> bool {
        let (primary, secondary) = self.hashes(item);

        (0..self.hash_rounds).all(|round| {
            let bit = self.probe(primary, secondary, round);
            let mask = 1u64 << (bit % 64);
            self.words[(bit / 64) as usize].load(Ordering::Relaxed) & mask != 0
        })
    }

    /// Fraction of bits currently set (diagnostic only)
    pub fn truthiness(&self) -> f64 {
        let set: u64 = self
            .words
            .iter()
            .map(|word| u64::from(word.load(Ordering::Relaxed).count_ones()))
            .sum();

        set as f64 / self.bit_count as f64
    }

    /// Size of the bit array (`m`)
    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    /// Number of probes per item (`k`)
    pub fn hash_rounds(&self) -> u32 {
        self.hash_rounds
    }

    fn hashes(&self, item: &T) -> (u64, u64) {
        let mut hasher = Xxh3::new();
        item.hash(&mut hasher);
        (hasher.finish(), (self.secondary)(item))
    }

    fn probe(&self, primary: u64, secondary: u64, round: u32) -> u64 {
        primary.wrapping_add(u64::from(round).wrapping_mul(secondary)) % self.bit_count
    }
}

impl<T: ?Sized> std::fmt::Debug for BloomFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bit_count", &self.bit_count)
            .field("hash_rounds", &self.hash_rounds)
            .finish()
    }
}

/// Error rate used when none is given: `1 / capacity`
///
/// Falls back to `0.6185 ^ (u32::MAX / capacity)` if the reciprocal underflows to zero.
pub fn best_error_rate(capacity: u64) -> f64 {
    let reciprocal = 1.0 / capacity as f64;
    if reciprocal > 0.0 {
        return reciprocal;
    }

    0.6185f64.powf(u32::MAX as f64 / capacity as f64)
}

/// Optimal bit count: `m = ceil(n * ln(p) / ln(1 / 2^ln2))`
pub fn best_bit_count(capacity: u64, error_rate: f64) -> Result<u64, FilterError> {
    if !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(FilterError::InvalidErrorRate(error_rate));
    }

    let m = (capacity as f64 * error_rate.ln() / (1.0 / 2f64.powf(LN_2)).ln()).ceil();
    if !m.is_finite() || m < 1.0 || m > MAX_BITS as f64 {
        return Err(FilterError::TooLarge {
            capacity,
            error_rate,
        });
    }

    Ok(m as u64)
}

/// Optimal number of hash rounds: `k = round(ln2 * m / n)`
pub fn best_hash_rounds(capacity: u64, bit_count: u64) -> u32 {
    (LN_2 * bit_count as f64 / capacity as f64).round().max(1.0) as u32
}
