use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Keys emitted for one index, kept in comparator order without duplicates.
pub type KeySet = BTreeSet<Vec<u8>>;

/// A storage key namespaced by the index it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    index_id: String,
    bytes: Vec<u8>,
}

impl IndexKey {
    pub fn new(index_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            index_id: index_id.into(),
            bytes,
        }
    }

    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index_id, hex::encode(&self.bytes))
    }
}

/// Unsigned byte-lexicographic order. Collation keys are built so that this
/// order is the collation order; range queries depend on it.
#[inline]
pub fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Smallest key greater than every key that starts with `prefix`.
///
/// Adds one to the last byte, carrying into earlier bytes past `0xFF`. Returns
/// `None` when every byte is `0xFF` (or `prefix` is empty): no such key exists
/// and the range has no upper bound.
pub fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut upper = prefix[..=last].to_vec();
    upper[last] += 1;
    Some(upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_prefix_range(key: &[u8], prefix: &[u8]) -> bool {
        let above = compare_keys(key, prefix) != Ordering::Less;
        let below = match increment_prefix(prefix) {
            Some(upper) => compare_keys(key, &upper) == Ordering::Less,
            None => true,
        };
        above && below
    }

    #[test]
    fn increments_last_byte() {
        assert_eq!(increment_prefix(&[0x80, 0x01]), Some(vec![0x80, 0x02]));
    }

    #[test]
    fn carries_past_ff() {
        assert_eq!(increment_prefix(&[0x01, 0xFF, 0xFF]), Some(vec![0x02]));
        assert_eq!(increment_prefix(&[0x7F, 0xFF]), Some(vec![0x80]));
    }

    #[test]
    fn all_ff_has_no_upper_bound() {
        assert_eq!(increment_prefix(&[0xFF, 0xFF]), None);
        assert_eq!(increment_prefix(&[]), None);
    }

    #[test]
    fn prefix_range_holds_exactly_prefixed_keys() {
        let prefixes: [&[u8]; 4] = [&[0x61], &[0x61, 0xFF], &[0xFF], &[0xFF, 0xFF]];
        let keys: [&[u8]; 9] = [
            &[],
            &[0x60, 0xFF],
            &[0x61],
            &[0x61, 0x00],
            &[0x61, 0xFF, 0xFF],
            &[0x62],
            &[0xFE, 0xFF],
            &[0xFF],
            &[0xFF, 0xFF, 0x00],
        ];
        for prefix in prefixes {
            for key in keys {
                assert_eq!(
                    in_prefix_range(key, prefix),
                    key.starts_with(prefix),
                    "key {key:?} prefix {prefix:?}"
                );
            }
        }
    }

    #[test]
    fn display_is_index_and_hex() {
        let key = IndexKey::new("en.equality", vec![0x80, 0x0a]);
        assert_eq!(key.to_string(), "en.equality:800a");
    }
}
