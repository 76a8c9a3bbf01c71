use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::RwLock;

use hashbrown::{HashMap, HashSet};

use crate::error::IndexError;
use crate::factory::IndexKeyFactory;
use crate::key::{compare_keys, KeySet};
use crate::query::QueryPlan;

/// Identifier of an indexed entry.
pub type EntryId = u64;

/// Trait for a key-postings store that can evaluate [`QueryPlan`]s.
/// Real directory backends live outside this crate; this is the contract the
/// reference in-memory store and tests share.
pub trait IndexBackend: Send + Sync {
    /// Record that `entry` has `key` in `index_id`.
    fn insert(&self, index_id: &str, key: &[u8], entry: EntryId) -> Result<(), IndexError>;
    /// Remove the `key` posting for `entry`.
    fn remove(&self, index_id: &str, key: &[u8], entry: EntryId) -> Result<(), IndexError>;
    /// Candidate entries satisfying the plan, in ascending id order.
    fn evaluate(&self, plan: &QueryPlan) -> Result<BTreeSet<EntryId>, IndexError>;

    /// Insert every key of a key set in one go.
    fn batch_insert(&self, index_id: &str, keys: &KeySet, entry: EntryId) -> Result<(), IndexError> {
        for key in keys {
            self.insert(index_id, key, entry)?;
        }
        Ok(())
    }

    /// Key the values with `factory` and post them for `entry`.
    fn index_values(
        &self,
        factory: &dyn IndexKeyFactory,
        values: &[&str],
        entry: EntryId,
    ) -> Result<(), IndexError> {
        self.batch_insert(factory.index_id(), &factory.keys(values), entry)
    }
}

type Postings = BTreeMap<Vec<u8>, HashSet<EntryId>>;

#[derive(Default)]
struct State {
    indexes: HashMap<String, Postings>,
    entries: BTreeSet<EntryId>,
}

/// An in-memory backend using a `RwLock` around ordered posting maps.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys stored for an index.
    pub fn key_count(&self, index_id: &str) -> usize {
        let guard = self.state.read().unwrap_or_else(|p| p.into_inner());
        guard.indexes.get(index_id).map_or(0, BTreeMap::len)
    }
}

impl IndexBackend for InMemoryBackend {
    fn insert(&self, index_id: &str, key: &[u8], entry: EntryId) -> Result<(), IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        guard
            .indexes
            .entry(index_id.to_owned())
            .or_default()
            .entry(key.to_vec())
            .or_default()
            .insert(entry);
        guard.entries.insert(entry);
        Ok(())
    }

    fn remove(&self, index_id: &str, key: &[u8], entry: EntryId) -> Result<(), IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if let Some(postings) = guard.indexes.get_mut(index_id) {
            if let Some(ids) = postings.get_mut(key) {
                ids.remove(&entry);
                if ids.is_empty() {
                    postings.remove(key);
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, plan: &QueryPlan) -> Result<BTreeSet<EntryId>, IndexError> {
        // A read lock is held for the whole evaluation.
        let guard = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(evaluate(&guard, plan))
    }
}

fn evaluate(state: &State, plan: &QueryPlan) -> BTreeSet<EntryId> {
    match plan {
        QueryPlan::Exact { index_id, key } => state
            .indexes
            .get(index_id.as_str())
            .and_then(|postings| postings.get(key))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default(),
        QueryPlan::Range {
            index_id,
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        } => {
            let Some(postings) = state.indexes.get(index_id.as_str()) else {
                return BTreeSet::new();
            };
            let Some(bounds) = range_bounds(lower, upper, *lower_inclusive, *upper_inclusive)
            else {
                return BTreeSet::new();
            };
            postings
                .range::<[u8], _>(bounds)
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect()
        }
        QueryPlan::Intersection(plans) => {
            let mut sets = plans.iter().map(|p| evaluate(state, p));
            let Some(first) = sets.next() else {
                return state.entries.clone();
            };
            sets.fold(first, |acc, set| acc.intersection(&set).copied().collect())
        }
        QueryPlan::Union(plans) => plans.iter().flat_map(|p| evaluate(state, p)).collect(),
        QueryPlan::MatchAll => state.entries.clone(),
    }
}

/// Translate plan bounds into `BTreeMap` bounds; `None` for an empty range.
fn range_bounds<'a>(
    lower: &'a [u8],
    upper: &'a [u8],
    lower_inclusive: bool,
    upper_inclusive: bool,
) -> Option<(Bound<&'a [u8]>, Bound<&'a [u8]>)> {
    if !lower.is_empty() && !upper.is_empty() {
        match compare_keys(lower, upper) {
            std::cmp::Ordering::Greater => return None,
            std::cmp::Ordering::Equal if !(lower_inclusive && upper_inclusive) => return None,
            _ => {}
        }
    }
    let start = match (lower.is_empty(), lower_inclusive) {
        (true, _) => Bound::Unbounded,
        (false, true) => Bound::Included(lower),
        (false, false) => Bound::Excluded(lower),
    };
    let end = match (upper.is_empty(), upper_inclusive) {
        (true, _) => Bound::Unbounded,
        (false, true) => Bound::Included(upper),
        (false, false) => Bound::Excluded(upper),
    };
    Some((start, end))
}
