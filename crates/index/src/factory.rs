use std::cmp::Ordering;
use std::fmt;

use collation::{substring_keys, Collator, Locale};
use log::debug;

use crate::approximate::{ApproximateNormalizer, Soundex};
use crate::error::IndexError;
use crate::key::{compare_keys, KeySet};

/// Window length used for substring keys when configuration does not say otherwise.
pub const DEFAULT_SUBSTRING_LENGTH: usize = 6;

/// Index id shared by every approximate-match key factory.
pub const APPROXIMATE_INDEX_ID: &str = "approximate";

/// Index id holding full collation keys for a locale (equality and ordering).
pub fn equality_index_id(locale: &Locale) -> String {
    format!("{}.equality", locale.index_name())
}

/// Index id holding substring windows of `window` bytes for a locale.
pub fn substring_index_id(locale: &Locale, window: usize) -> String {
    format!("{}.substring.{window}", locale.index_name())
}

/// Turns attribute values into the keys stored in one index.
pub trait IndexKeyFactory: Send + Sync + fmt::Debug {
    /// Opaque identifier namespacing this factory's keys.
    fn index_id(&self) -> &str;

    /// Add the keys for one value.
    fn add_keys(&self, value: &str, keys: &mut KeySet) -> Result<(), IndexError>;

    /// Keys for a batch of values. Values that cannot be keyed are skipped.
    fn keys(&self, values: &[&str]) -> KeySet {
        let mut keys = KeySet::new();
        for value in values {
            if let Err(err) = self.add_keys(value, &mut keys) {
                debug!("index {}: skipping value: {err}", self.index_id());
            }
        }
        keys
    }

    /// Order in which the backend must keep this index's keys.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        compare_keys(a, b)
    }
}

/// One full collation key per value. Serves equality and all four orderings.
#[derive(Debug, Clone)]
pub struct CollationKeyFactory {
    collator: Collator,
    index_id: String,
}

impl CollationKeyFactory {
    pub fn new(collator: Collator) -> Self {
        let index_id = equality_index_id(collator.locale());
        Self { collator, index_id }
    }

    pub fn collator(&self) -> &Collator {
        &self.collator
    }
}

impl IndexKeyFactory for CollationKeyFactory {
    fn index_id(&self) -> &str {
        &self.index_id
    }

    fn add_keys(&self, value: &str, keys: &mut KeySet) -> Result<(), IndexError> {
        keys.insert(self.collator.full_key(value));
        Ok(())
    }
}

/// Overlapping windows over each value's fragment key.
#[derive(Debug, Clone)]
pub struct SubstringKeyFactory {
    collator: Collator,
    window: usize,
    index_id: String,
}

impl SubstringKeyFactory {
    pub fn new(collator: Collator, window: usize) -> Result<Self, IndexError> {
        if window == 0 {
            return Err(IndexError::InvalidWindowLength(window));
        }
        let index_id = substring_index_id(collator.locale(), window);
        Ok(Self {
            collator,
            window,
            index_id,
        })
    }

    pub fn collator(&self) -> &Collator {
        &self.collator
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl IndexKeyFactory for SubstringKeyFactory {
    fn index_id(&self) -> &str {
        &self.index_id
    }

    fn add_keys(&self, value: &str, keys: &mut KeySet) -> Result<(), IndexError> {
        keys.extend(substring_keys(&self.collator, value, self.window));
        Ok(())
    }
}

/// One phonetic key per value, produced by a pluggable normalizer.
#[derive(Debug, Clone, Default)]
pub struct ApproximateKeyFactory<N = Soundex> {
    normalizer: N,
}

impl<N: ApproximateNormalizer> ApproximateKeyFactory<N> {
    pub fn new(normalizer: N) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }
}

impl<N: ApproximateNormalizer> IndexKeyFactory for ApproximateKeyFactory<N> {
    fn index_id(&self) -> &str {
        APPROXIMATE_INDEX_ID
    }

    fn add_keys(&self, value: &str, keys: &mut KeySet) -> Result<(), IndexError> {
        keys.insert(self.normalizer.normalize(value)?);
        Ok(())
    }
}
