//! Secondary hash functions for the membership filter
//!
//! The filter derives all of its probe positions from two hashes. The primary hash
//! comes from the element's `Hash` implementation; the secondary one comes from here
//! (or from a caller-supplied function for other element types).

/// Element types that carry a built-in secondary hash
pub trait BuiltinHash {
    /// Returns the secondary hash of this value
    fn builtin_hash(&self) -> u64;
}

impl BuiltinHash for str {
    fn builtin_hash(&self) -> u64 {
        string_hash(self)
    }
}

impl BuiltinHash for String {
    fn builtin_hash(&self) -> u64 {
        string_hash(self)
    }
}

macro_rules! impl_builtin_int_hash {
    ($($ty:ty),*) => {
        $(
            impl BuiltinHash for $ty {
                fn builtin_hash(&self) -> u64 {
                    int_hash(*self as u64)
                }
            }
        )*
    };
}

impl_builtin_int_hash!(i32, u32, i64, u64, usize);

/// Jenkins one-at-a-time hash over the UTF-8 bytes of a string
///
/// # Examples
///
/// ```
/// use link_ripple::filter::string_hash;
///
/// assert_eq!(string_hash("abc"), string_hash("abc"));
/// assert_ne!(string_hash("abc"), string_hash("abd"));
/// ```
pub fn string_hash(input: &str) -> u64 {
    let mut hash: u32 = 0;

    for byte in input.bytes() {
        hash = hash.wrapping_add(u32::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }

    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);

    u64::from(hash)
}

/// 64-bit integer mix (splitmix64 finalizer)
pub fn int_hash(input: u64) -> u64 {
    let mut x = input;
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_is_stable() {
        assert_eq!(string_hash("https://example.com/"), string_hash("https://example.com/"));
    }

    #[test]
    fn test_string_hash_empty() {
        assert_eq!(string_hash(""), 0);
    }

    #[test]
    fn test_string_and_str_agree() {
        let owned = String::from("https://example.com/a");
        assert_eq!(owned.builtin_hash(), owned.as_str().builtin_hash());
    }

    #[test]
    fn test_int_hash_spreads_neighbours() {
        assert_ne!(int_hash(1), int_hash(2));
        assert_ne!(int_hash(1) & 0xffff, int_hash(2) & 0xffff);
    }

    #[test]
    fn test_int_widths_agree() {
        assert_eq!(7u32.builtin_hash(), 7u64.builtin_hash());
        assert_eq!(7usize.builtin_hash(), 7i64.builtin_hash());
    }
}
